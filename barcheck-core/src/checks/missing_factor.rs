//! Missing-factor check: the adjustment factor column must exist and hold data.
//!
//! Indices and benchmarks carry no adjustment factor, so identifiers on the
//! exemption list are skipped entirely.

use super::finding::{CheckKind, Finding, FindingDetail};
use super::HealthCheck;
use crate::data::SeriesStore;
use crate::domain::{Field, InstrumentSeries};

/// Identifiers exempt from the factor check.
///
/// An identifier is exempt when it contains any listed code, so `SH000300`
/// and `000300.csv`-style names match the code `000300`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExemptionList {
    codes: Vec<String>,
}

impl ExemptionList {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes
                .into_iter()
                .map(Into::into)
                .filter(|c: &String| !c.is_empty())
                .collect(),
        }
    }

    pub fn is_exempt(&self, identifier: &str) -> bool {
        self.codes.iter().any(|code| identifier.contains(code.as_str()))
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MissingFactorCheck {
    pub exempt: ExemptionList,
}

impl MissingFactorCheck {
    pub fn new(exempt: ExemptionList) -> Self {
        Self { exempt }
    }

    pub fn inspect(&self, series: &InstrumentSeries) -> Option<Finding> {
        if self.exempt.is_exempt(series.identifier()) {
            return None;
        }

        let (missing_factor_col, missing_factor_data) = match series.is_all_null(Field::Factor) {
            None => (true, false),
            Some(all_null) => (false, all_null),
        };

        if !missing_factor_col && !missing_factor_data {
            return None;
        }
        Some(Finding::new(
            series.identifier(),
            FindingDetail::MissingFactor {
                missing_factor_col,
                missing_factor_data,
            },
        ))
    }
}

impl HealthCheck for MissingFactorCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::MissingFactor
    }

    fn run(&self, store: &SeriesStore) -> Vec<Finding> {
        store.iter().filter_map(|s| self.inspect(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{series, v};
    use crate::config::DEFAULT_FACTOR_EXEMPT;

    fn default_check() -> MissingFactorCheck {
        MissingFactorCheck::new(ExemptionList::new(DEFAULT_FACTOR_EXEMPT))
    }

    #[test]
    fn absent_factor_column_is_flagged() {
        let s = series("2330", &[(Field::Close, v(&[1.0]))]);
        let finding = default_check().inspect(&s).unwrap();
        assert_eq!(
            finding.detail,
            FindingDetail::MissingFactor {
                missing_factor_col: true,
                missing_factor_data: false
            }
        );
    }

    #[test]
    fn all_null_factor_is_flagged_as_missing_data() {
        let s = series("2330", &[(Field::Factor, vec![None, None])]);
        let finding = default_check().inspect(&s).unwrap();
        assert_eq!(
            finding.detail,
            FindingDetail::MissingFactor {
                missing_factor_col: false,
                missing_factor_data: true
            }
        );
    }

    #[test]
    fn partially_null_factor_passes() {
        let s = series("2330", &[(Field::Factor, vec![None, Some(1.0)])]);
        assert!(default_check().inspect(&s).is_none());
    }

    #[test]
    fn benchmark_symbols_are_skipped() {
        let s = series("^TWII", &[(Field::Close, v(&[1.0]))]);
        assert!(default_check().inspect(&s).is_none());

        let s = series("SH000300", &[(Field::Close, v(&[1.0]))]);
        assert!(default_check().inspect(&s).is_none());
    }

    #[test]
    fn exemption_list_is_overridable() {
        let s = series("^TWII", &[(Field::Close, v(&[1.0]))]);
        let check = MissingFactorCheck::new(ExemptionList::new(["SPX"]));
        assert!(check.inspect(&s).is_some());

        let s = series("SPX", &[(Field::Close, v(&[1.0]))]);
        assert!(check.inspect(&s).is_none());
    }

    #[test]
    fn empty_codes_never_exempt_everything() {
        let list = ExemptionList::new(["", "SPX"]);
        assert!(!list.is_exempt("AAPL"));
        assert_eq!(list.codes(), &["SPX".to_string()]);
    }
}
