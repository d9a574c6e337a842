//! Large-step check: period-over-period jumps in the OHLCV columns.

use super::finding::{CheckKind, Finding, FindingDetail};
use super::HealthCheck;
use crate::data::SeriesStore;
use crate::domain::{Field, InstrumentSeries};

/// Flags a column when its largest absolute percentage change exceeds the
/// threshold for that column: `price_threshold` for open/high/low/close,
/// `volume_threshold` for volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LargeStepCheck {
    pub price_threshold: f64,
    pub volume_threshold: f64,
}

impl Default for LargeStepCheck {
    fn default() -> Self {
        Self {
            price_threshold: 0.5,
            volume_threshold: 3.0,
        }
    }
}

/// Where a column first crossed the threshold, and how large the largest
/// change was.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepExceedance {
    /// Row index of the first observation whose change exceeds the threshold.
    pub first_row: usize,
    pub max_change: f64,
}

/// Absolute percentage change `|x[i] / x[i-1] - 1|` for each row after the
/// first. `None` where either value is null or the ratio is undefined (0/0).
/// A move away from zero is infinite.
pub fn pct_changes(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values
        .windows(2)
        .map(|pair| match (pair[0], pair[1]) {
            (Some(prev), Some(cur)) => {
                let change = (cur / prev - 1.0).abs();
                (!change.is_nan()).then_some(change)
            }
            _ => None,
        })
        .collect()
}

/// Scan one column. Returns `None` unless the maximum change is strictly
/// above `threshold`.
pub fn find_large_step(values: &[Option<f64>], threshold: f64) -> Option<StepExceedance> {
    let mut first_row = None;
    let mut max_change = f64::NEG_INFINITY;

    for (i, change) in pct_changes(values).into_iter().enumerate() {
        let Some(change) = change else { continue };
        if change > max_change {
            max_change = change;
        }
        if first_row.is_none() && change > threshold {
            // Changes start at the second row.
            first_row = Some(i + 1);
        }
    }

    first_row.map(|first_row| StepExceedance {
        first_row,
        max_change,
    })
}

impl LargeStepCheck {
    pub fn new(price_threshold: f64, volume_threshold: f64) -> Self {
        Self {
            price_threshold,
            volume_threshold,
        }
    }

    pub fn threshold_for(&self, field: Field) -> f64 {
        if field == Field::Volume {
            self.volume_threshold
        } else {
            self.price_threshold
        }
    }

    /// One finding per flagged column, in OHLCV order. Absent columns are
    /// skipped silently.
    pub fn inspect(&self, series: &InstrumentSeries) -> Vec<Finding> {
        Field::OHLCV
            .into_iter()
            .filter_map(|field| {
                let values = series.column(field)?;
                let step = find_large_step(values, self.threshold_for(field))?;
                Some(Finding::new(
                    series.identifier(),
                    FindingDetail::LargeStepChange {
                        field,
                        timestamp: series.timestamps()[step.first_row],
                        pct_change: step.max_change,
                    },
                ))
            })
            .collect()
    }
}

impl HealthCheck for LargeStepCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::LargeStepChange
    }

    fn run(&self, store: &SeriesStore) -> Vec<Finding> {
        store.iter().flat_map(|s| self.inspect(s)).collect()
    }
}
