//! Missing-data check: null observations in the OHLCV columns.

use super::finding::{CheckKind, Finding, FindingDetail};
use super::HealthCheck;
use crate::data::SeriesStore;
use crate::domain::{Field, InstrumentSeries};

/// Flags a series when any OHLCV column has more than `tolerance` nulls.
///
/// Absent columns are not counted here; the required-columns check
/// reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MissingDataCheck {
    pub tolerance: usize,
}

impl MissingDataCheck {
    pub fn new(tolerance: usize) -> Self {
        Self { tolerance }
    }

    pub fn inspect(&self, series: &InstrumentSeries) -> Option<Finding> {
        let null_counts: Vec<(Field, usize)> = Field::OHLCV
            .into_iter()
            .filter_map(|field| series.null_count(field).map(|n| (field, n)))
            .collect();

        if null_counts.iter().all(|(_, n)| *n <= self.tolerance) {
            return None;
        }

        Some(Finding::new(
            series.identifier(),
            FindingDetail::MissingData { null_counts },
        ))
    }
}

impl HealthCheck for MissingDataCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::MissingData
    }

    fn run(&self, store: &SeriesStore) -> Vec<Finding> {
        store.iter().filter_map(|s| self.inspect(s)).collect()
    }
}
