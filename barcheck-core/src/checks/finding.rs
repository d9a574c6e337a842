//! Findings: one record per detected data-quality defect.

use crate::domain::{format_timestamp, Field};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four health checks, in the order the engine runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    MissingData,
    LargeStepChange,
    MissingRequiredColumn,
    MissingFactor,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [
        CheckKind::MissingData,
        CheckKind::LargeStepChange,
        CheckKind::MissingRequiredColumn,
        CheckKind::MissingFactor,
    ];

    /// Short name, also the CLI subcommand.
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::MissingData => "missing-data",
            CheckKind::LargeStepChange => "large-steps",
            CheckKind::MissingRequiredColumn => "required-columns",
            CheckKind::MissingFactor => "missing-factor",
        }
    }

    pub fn passed_message(&self) -> &'static str {
        match self {
            CheckKind::MissingData => "There are no missing data.",
            CheckKind::LargeStepChange => {
                "There are no large step changes in the OHLCV columns above the threshold."
            }
            CheckKind::MissingRequiredColumn => "The OHLCV columns are complete and not missing.",
            CheckKind::MissingFactor => "The factor column exists and is not empty.",
        }
    }

    pub fn failed_message(&self) -> &'static str {
        match self {
            CheckKind::MissingData => "There is missing data.",
            CheckKind::LargeStepChange => "The OHLCV columns have large step changes.",
            CheckKind::MissingRequiredColumn => "OHLCV columns are missing.",
            CheckKind::MissingFactor => "The factor column does not exist or is empty.",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind-specific payload of a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingDetail {
    /// Null counts for every OHLCV column present in the series.
    MissingData { null_counts: Vec<(Field, usize)> },

    /// First timestamp exceeding the threshold, and the largest change seen.
    LargeStepChange {
        field: Field,
        timestamp: NaiveDateTime,
        pct_change: f64,
    },

    MissingRequiredColumn { missing: Vec<Field> },

    MissingFactor {
        missing_factor_col: bool,
        missing_factor_data: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub instrument: String,
    #[serde(flatten)]
    pub detail: FindingDetail,
}

impl Finding {
    pub fn new(instrument: impl Into<String>, detail: FindingDetail) -> Self {
        Self {
            instrument: instrument.into(),
            detail,
        }
    }

    pub fn kind(&self) -> CheckKind {
        match self.detail {
            FindingDetail::MissingData { .. } => CheckKind::MissingData,
            FindingDetail::LargeStepChange { .. } => CheckKind::LargeStepChange,
            FindingDetail::MissingRequiredColumn { .. } => CheckKind::MissingRequiredColumn,
            FindingDetail::MissingFactor { .. } => CheckKind::MissingFactor,
        }
    }

    /// Null count recorded for `field` in a missing-data finding.
    pub fn null_count(&self, field: Field) -> Option<usize> {
        match &self.detail {
            FindingDetail::MissingData { null_counts } => null_counts
                .iter()
                .find(|(f, _)| *f == field)
                .map(|(_, n)| *n),
            _ => None,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            FindingDetail::MissingData { null_counts } => {
                let counts: Vec<String> = null_counts
                    .iter()
                    .map(|(field, n)| format!("{field}={n}"))
                    .collect();
                write!(f, "{}: nulls {}", self.instrument, counts.join(" "))
            }
            FindingDetail::LargeStepChange {
                field,
                timestamp,
                pct_change,
            } => write!(
                f,
                "{}: {field} changed by {pct_change:.4} (first above threshold on {})",
                self.instrument,
                format_timestamp(timestamp)
            ),
            FindingDetail::MissingRequiredColumn { missing } => {
                let names: Vec<&str> = missing.iter().map(|m| m.as_str()).collect();
                write!(f, "{}: missing {}", self.instrument, names.join(", "))
            }
            FindingDetail::MissingFactor {
                missing_factor_col,
                missing_factor_data,
            } => write!(
                f,
                "{}: missing_factor_col={missing_factor_col} missing_factor_data={missing_factor_data}",
                self.instrument
            ),
        }
    }
}
