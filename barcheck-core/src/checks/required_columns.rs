//! Required-columns check: every series must carry all five OHLCV columns.

use super::finding::{CheckKind, Finding, FindingDetail};
use super::HealthCheck;
use crate::data::SeriesStore;
use crate::domain::{Field, InstrumentSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequiredColumnsCheck;

impl RequiredColumnsCheck {
    pub fn inspect(&self, series: &InstrumentSeries) -> Option<Finding> {
        let missing: Vec<Field> = Field::OHLCV
            .into_iter()
            .filter(|f| !series.has_column(*f))
            .collect();

        if missing.is_empty() {
            return None;
        }
        Some(Finding::new(
            series.identifier(),
            FindingDetail::MissingRequiredColumn { missing },
        ))
    }
}

impl HealthCheck for RequiredColumnsCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::MissingRequiredColumn
    }

    fn run(&self, store: &SeriesStore) -> Vec<Finding> {
        store.iter().filter_map(|s| self.inspect(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{ohlcv, series, v};

    #[test]
    fn complete_series_passes() {
        let s = ohlcv("SPY", 3);
        assert!(RequiredColumnsCheck.inspect(&s).is_none());
    }

    #[test]
    fn lists_each_missing_column() {
        let s = series(
            "SPY",
            &[
                (Field::Open, v(&[1.0])),
                (Field::Close, v(&[1.0])),
                (Field::Factor, v(&[1.0])),
            ],
        );
        let finding = RequiredColumnsCheck.inspect(&s).unwrap();
        assert_eq!(
            finding.detail,
            FindingDetail::MissingRequiredColumn {
                missing: vec![Field::High, Field::Low, Field::Volume]
            }
        );
    }

    #[test]
    fn all_null_column_still_counts_as_present() {
        let mut cols: Vec<(Field, Vec<Option<f64>>)> =
            Field::OHLCV.into_iter().map(|f| (f, v(&[1.0]))).collect();
        cols[4].1 = vec![None];
        let s = series("SPY", &cols);
        assert!(RequiredColumnsCheck.inspect(&s).is_none());
    }
}
