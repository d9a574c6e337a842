//! InstrumentSeries: one instrument's time-indexed table of canonical columns.

use super::field::Field;
use chrono::{NaiveDateTime, Timelike};
use std::collections::BTreeMap;
use thiserror::Error;

/// A nullable column of observations, aligned with the series timestamps.
pub type Column = Vec<Option<f64>>;

/// Structural problems that prevent a series from being constructed.
///
/// These are loader-level defects: the store skips the instrument rather
/// than letting the checks see a malformed table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("column '{field}' has {actual} values but the series has {expected} timestamps")]
    LengthMismatch {
        field: Field,
        expected: usize,
        actual: usize,
    },

    #[error("timestamps not strictly increasing at row {row} ({timestamp})")]
    NotIncreasing { row: usize, timestamp: NaiveDateTime },
}

/// Time-indexed observations for a single instrument.
///
/// A field missing from `columns` is an absent column; `None` inside a
/// column is a null observation. NaN values are normalized to `None` on
/// construction, so checks only ever see `None` for "no value".
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSeries {
    identifier: String,
    timestamps: Vec<NaiveDateTime>,
    columns: BTreeMap<Field, Column>,
}

impl InstrumentSeries {
    /// Build a series, validating column lengths and timestamp order.
    pub fn new(
        identifier: impl Into<String>,
        timestamps: Vec<NaiveDateTime>,
        columns: BTreeMap<Field, Column>,
    ) -> Result<Self, SeriesError> {
        let expected = timestamps.len();
        for (field, values) in &columns {
            if values.len() != expected {
                return Err(SeriesError::LengthMismatch {
                    field: *field,
                    expected,
                    actual: values.len(),
                });
            }
        }

        for (row, pair) in timestamps.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(SeriesError::NotIncreasing {
                    row: row + 1,
                    timestamp: pair[1],
                });
            }
        }

        let columns = columns
            .into_iter()
            .map(|(field, values)| {
                let values = values
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect();
                (field, values)
            })
            .collect();

        Ok(Self {
            identifier: identifier.into(),
            timestamps,
            columns,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The values of `field`, or `None` if the column is absent.
    pub fn column(&self, field: Field) -> Option<&[Option<f64>]> {
        self.columns.get(&field).map(|v| v.as_slice())
    }

    pub fn has_column(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    /// Columns present in this series, in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.columns.keys().copied()
    }

    /// Number of nulls in `field`, or `None` if the column is absent.
    pub fn null_count(&self, field: Field) -> Option<usize> {
        self.column(field)
            .map(|values| values.iter().filter(|v| v.is_none()).count())
    }

    /// Whether every value of `field` is null (true for an empty column).
    /// `None` if the column is absent.
    pub fn is_all_null(&self, field: Field) -> Option<bool> {
        self.column(field)
            .map(|values| values.iter().all(|v| v.is_none()))
    }
}

/// Render a timestamp the way reports show it: date only for daily bars,
/// date and time otherwise.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.num_seconds_from_midnight() == 0 && ts.nanosecond() == 0 {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
