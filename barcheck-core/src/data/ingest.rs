//! Per-instrument file ingestion (CSV and Parquet) into `InstrumentSeries`.
//!
//! Every failure here is a `LoadError`: it concerns one instrument only, and
//! the store logs it and moves on.

use super::provider::{ProviderError, ProviderFrame};
use super::schema::{is_timestamp_column, parse_timestamp, parse_value};
use crate::domain::{Field, InstrumentSeries, SeriesError};
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Why a single instrument could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet I/O error: {0}")]
    Parquet(String),

    #[error("no timestamp column (expected one of: date, datetime, timestamp)")]
    MissingTimestamp,

    #[error("unparseable timestamp '{value}' at row {row}")]
    BadTimestamp { row: usize, value: String },

    #[error("non-numeric value '{value}' in column '{field}' at row {row}")]
    BadValue {
        row: usize,
        field: Field,
        value: String,
    },

    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("invalid series: {0}")]
    Series(#[from] SeriesError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Supported per-instrument file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    /// Detect the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<FileFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "parquet" => Some(FileFormat::Parquet),
            _ => None,
        }
    }
}

/// The identifier an instrument file contributes: its file stem.
pub fn identifier_for(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

/// Load one instrument file, dispatching on its extension.
pub fn load_file(path: &Path, identifier: &str) -> Result<InstrumentSeries, LoadError> {
    match FileFormat::from_path(path) {
        Some(FileFormat::Csv) => load_csv(path, identifier),
        Some(FileFormat::Parquet) => load_parquet(path, identifier),
        None => Err(LoadError::UnsupportedFile(path.display().to_string())),
    }
}

/// Load a headered CSV file.
///
/// Needs a timestamp column; keeps whichever canonical columns are present
/// and ignores everything else. Rows are sorted by timestamp.
pub fn load_csv(path: &Path, identifier: &str) -> Result<InstrumentSeries, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let ts_idx = headers
        .iter()
        .position(is_timestamp_column)
        .ok_or(LoadError::MissingTimestamp)?;

    // First occurrence wins if a header is repeated.
    let mut field_idx: Vec<(Field, usize)> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if let Some(field) = Field::from_name(name) {
            if !field_idx.iter().any(|(f, _)| *f == field) {
                field_idx.push((field, idx));
            }
        }
    }

    let mut timestamps = Vec::new();
    let mut columns: BTreeMap<Field, Vec<Option<f64>>> =
        field_idx.iter().map(|(f, _)| (*f, Vec::new())).collect();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let row = i + 2;

        let raw_ts = record.get(ts_idx).unwrap_or_default();
        let ts = parse_timestamp(raw_ts).ok_or_else(|| LoadError::BadTimestamp {
            row,
            value: raw_ts.to_string(),
        })?;
        timestamps.push(ts);

        for (field, idx) in &field_idx {
            let raw = record.get(*idx).unwrap_or_default();
            let value = parse_value(raw).map_err(|_| LoadError::BadValue {
                row,
                field: *field,
                value: raw.to_string(),
            })?;
            if let Some(values) = columns.get_mut(field) {
                values.push(value);
            }
        }
    }

    let (timestamps, columns) = sort_by_timestamp(timestamps, columns)?;
    Ok(InstrumentSeries::new(identifier, timestamps, columns)?)
}

/// Load a Parquet file written with a date/datetime/string timestamp column.
pub fn load_parquet(path: &Path, identifier: &str) -> Result<InstrumentSeries, LoadError> {
    let file = fs::File::open(path)?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| LoadError::Parquet(format!("read: {e}")))?;
    dataframe_to_series(&df, identifier)
}

/// Convert a DataFrame into an InstrumentSeries.
///
/// Columns may use canonical (`close`) or provider-native (`$close`) names.
pub fn dataframe_to_series(df: &DataFrame, identifier: &str) -> Result<InstrumentSeries, LoadError> {
    let map_err = |e: PolarsError| LoadError::Parquet(format!("column read: {e}"));

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    let ts_name = names
        .iter()
        .find(|n| is_timestamp_column(n))
        .ok_or(LoadError::MissingTimestamp)?;
    let timestamps = timestamp_column(df.column(ts_name).map_err(map_err)?)?;

    let mut columns: BTreeMap<Field, Vec<Option<f64>>> = BTreeMap::new();
    for name in &names {
        let Some(field) = Field::from_name(name).or_else(|| Field::from_provider_name(name)) else {
            continue;
        };
        if columns.contains_key(&field) {
            continue;
        }
        let cast = df
            .column(name)
            .map_err(map_err)?
            .cast(&DataType::Float64)
            .map_err(map_err)?;
        let ca = cast.f64().map_err(map_err)?;
        let values: Vec<Option<f64>> = (0..df.height()).map(|i| ca.get(i)).collect();
        columns.insert(field, values);
    }

    let (timestamps, columns) = sort_by_timestamp(timestamps, columns)?;
    Ok(InstrumentSeries::new(identifier, timestamps, columns)?)
}

fn timestamp_column(column: &Column) -> Result<Vec<NaiveDateTime>, LoadError> {
    let n = column.len();
    let null_ts = |row: usize| LoadError::BadTimestamp {
        row,
        value: "null".into(),
    };
    let map_err = |e: PolarsError| LoadError::Parquet(format!("timestamp column: {e}"));

    match column.dtype() {
        DataType::Date => {
            let ca = column.date().map_err(map_err)?;
            // Default is 1970-01-01T00:00:00.
            let epoch = NaiveDateTime::default();
            (0..n)
                .map(|i| {
                    ca.get(i)
                        .map(|days| epoch + chrono::Duration::days(days as i64))
                        .ok_or_else(|| null_ts(i))
                })
                .collect()
        }
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let ca = column.datetime().map_err(map_err)?;
            (0..n)
                .map(|i| {
                    let v = ca.get(i).ok_or_else(|| null_ts(i))?;
                    let ts = match unit {
                        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(v),
                        TimeUnit::Microseconds => DateTime::from_timestamp_micros(v),
                        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(v)),
                    };
                    ts.map(|t| t.naive_utc()).ok_or_else(|| LoadError::BadTimestamp {
                        row: i,
                        value: v.to_string(),
                    })
                })
                .collect()
        }
        DataType::String => {
            let ca = column.str().map_err(map_err)?;
            (0..n)
                .map(|i| {
                    let raw = ca.get(i).ok_or_else(|| null_ts(i))?;
                    parse_timestamp(raw).ok_or_else(|| LoadError::BadTimestamp {
                        row: i,
                        value: raw.to_string(),
                    })
                })
                .collect()
        }
        other => Err(LoadError::Parquet(format!(
            "unsupported timestamp dtype {other:?}"
        ))),
    }
}

/// Map a provider frame onto canonical columns, dropping unknown names.
pub fn frame_to_series(frame: ProviderFrame, identifier: &str) -> Result<InstrumentSeries, LoadError> {
    let mut columns: BTreeMap<Field, Vec<Option<f64>>> = BTreeMap::new();
    for (name, values) in frame.columns {
        if let Some(field) = Field::from_provider_name(&name).or_else(|| Field::from_name(&name)) {
            columns.entry(field).or_insert(values);
        }
    }
    let (timestamps, columns) = sort_by_timestamp(frame.timestamps, columns)?;
    Ok(InstrumentSeries::new(identifier, timestamps, columns)?)
}

/// Reorder rows by ascending timestamp. Stable, so duplicates keep file
/// order and are then rejected by `InstrumentSeries::new`.
///
/// Every column must already match the timestamp count; a short or long
/// column is a `LengthMismatch`, never padded or cut to fit.
fn sort_by_timestamp(
    timestamps: Vec<NaiveDateTime>,
    columns: BTreeMap<Field, Vec<Option<f64>>>,
) -> Result<(Vec<NaiveDateTime>, BTreeMap<Field, Vec<Option<f64>>>), SeriesError> {
    let expected = timestamps.len();
    if let Some((field, values)) = columns.iter().find(|(_, v)| v.len() != expected) {
        return Err(SeriesError::LengthMismatch {
            field: *field,
            expected,
            actual: values.len(),
        });
    }

    if timestamps.windows(2).all(|w| w[0] <= w[1]) {
        return Ok((timestamps, columns));
    }

    let mut order: Vec<usize> = (0..timestamps.len()).collect();
    order.sort_by_key(|&i| timestamps[i]);

    let sorted_ts = order.iter().map(|&i| timestamps[i]).collect();
    let sorted_columns = columns
        .into_iter()
        .map(|(field, values)| {
            let values = order.iter().map(|&i| values[i]).collect();
            (field, values)
        })
        .collect();
    Ok((sorted_ts, sorted_columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_with_nulls_and_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "AAPL.csv",
            "date,symbol,open,high,low,close,volume,factor\n\
             2024-01-02,AAPL,1,2,0.5,1.5,100,1\n\
             2024-01-03,AAPL,,2,0.5,1.6,nan,1\n",
        );

        let series = load_csv(&path, "AAPL").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.null_count(Field::Open), Some(1));
        assert_eq!(series.null_count(Field::Volume), Some(1));
        assert_eq!(series.null_count(Field::Close), Some(0));
        assert!(series.has_column(Field::Factor));
    }

    #[test]
    fn csv_rows_are_sorted_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "X.csv",
            "date,close\n2024-01-04,3\n2024-01-02,1\n2024-01-03,2\n",
        );

        let series = load_csv(&path, "X").unwrap();
        let closes: Vec<_> = series.column(Field::Close).unwrap().to_vec();
        assert_eq!(closes, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn csv_duplicate_timestamp_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "X.csv", "date,close\n2024-01-02,1\n2024-01-02,2\n");

        let err = load_csv(&path, "X").unwrap_err();
        assert!(matches!(err, LoadError::Series(SeriesError::NotIncreasing { .. })));
    }

    #[test]
    fn csv_without_timestamp_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "X.csv", "open,close\n1,2\n");

        assert!(matches!(
            load_csv(&path, "X").unwrap_err(),
            LoadError::MissingTimestamp
        ));
    }

    #[test]
    fn csv_non_numeric_value_reports_row_and_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "X.csv", "date,close\n2024-01-02,1\n2024-01-03,abc\n");

        match load_csv(&path, "X").unwrap_err() {
            LoadError::BadValue { row, field, value } => {
                assert_eq!(row, 3);
                assert_eq!(field, Field::Close);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parquet_roundtrip_through_polars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SPY.parquet");

        let mut df = df!(
            "date" => &["2024-01-02", "2024-01-03"],
            "$close" => &[Some(470.0), None],
            "volume" => &[1000i64, 1200],
        )
        .unwrap();
        let file = fs::File::create(&path).unwrap();
        ParquetWriter::new(file).finish(&mut df).unwrap();

        let series = load_file(&path, "SPY").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.null_count(Field::Close), Some(1));
        assert_eq!(
            series.column(Field::Volume).unwrap(),
            &[Some(1000.0), Some(1200.0)]
        );
        assert!(!series.has_column(Field::Factor));
    }

    #[test]
    fn provider_frame_maps_native_names() {
        let ts = parse_timestamp("2024-01-02").unwrap();
        let frame = ProviderFrame {
            timestamps: vec![ts],
            columns: vec![
                ("$close".into(), vec![Some(1.0)]),
                ("$vwap".into(), vec![Some(1.0)]),
            ],
        };
        let series = frame_to_series(frame, "X").unwrap();
        assert_eq!(series.fields().collect::<Vec<_>>(), vec![Field::Close]);
    }

    #[test]
    fn unsorted_frame_with_short_column_is_a_length_mismatch() {
        let ts = |d: &str| parse_timestamp(d).unwrap();
        let frame = ProviderFrame {
            timestamps: vec![ts("2024-01-03"), ts("2024-01-02"), ts("2024-01-04")],
            columns: vec![("$close".into(), vec![Some(1.0)])],
        };

        let err = frame_to_series(frame, "X").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Series(SeriesError::LengthMismatch {
                field: Field::Close,
                expected: 3,
                actual: 1
            })
        ));
    }

    #[test]
    fn unsorted_frame_keeps_values_on_their_dates() {
        let ts = |d: &str| parse_timestamp(d).unwrap();
        let frame = ProviderFrame {
            timestamps: vec![ts("2024-01-03"), ts("2024-01-02")],
            columns: vec![("$close".into(), vec![Some(3.0), Some(2.0)])],
        };

        let series = frame_to_series(frame, "X").unwrap();
        assert_eq!(series.timestamps()[0], ts("2024-01-02"));
        assert_eq!(series.column(Field::Close).unwrap(), &[Some(2.0), Some(3.0)]);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = load_file(Path::new("prices.xlsx"), "prices").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFile(_)));
    }
}
