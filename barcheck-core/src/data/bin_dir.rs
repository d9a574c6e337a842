//! Provider over a dumped binary data directory.
//!
//! Layout:
//! - `{root}/calendars/{freq}.txt`: one timestamp per line
//! - `{root}/instruments/{market}.txt`: `SYMBOL<TAB>START<TAB>END` per line
//! - `{root}/features/{symbol}/{field}.{freq}.bin`: little-endian `f32`s;
//!   the first value is the calendar index of the first observation, the rest
//!   are consecutive observations from there
//!
//! Symbol directories are lowercase. A missing feature file means the field
//! is absent for that instrument.

use super::provider::{MarketDataProvider, ProviderError, ProviderFrame};
use super::schema::parse_timestamp;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub struct BinDirProvider {
    root: PathBuf,
    calendars: Mutex<HashMap<String, Arc<Vec<NaiveDateTime>>>>,
}

/// One decoded feature file: where it starts on the calendar, and its values.
#[derive(Debug, Clone, PartialEq)]
struct FeatureSpan {
    start: usize,
    values: Vec<f32>,
}

impl BinDirProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            calendars: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn calendar_path(&self, freq: &str) -> PathBuf {
        self.root.join("calendars").join(format!("{freq}.txt"))
    }

    fn instruments_path(&self, market: &str) -> PathBuf {
        self.root.join("instruments").join(format!("{market}.txt"))
    }

    fn feature_dir(&self, symbol: &str) -> PathBuf {
        self.root.join("features").join(symbol.to_lowercase())
    }

    /// Trading calendar for `freq`, read once and shared afterwards.
    pub fn calendar(&self, freq: &str) -> Result<Arc<Vec<NaiveDateTime>>, ProviderError> {
        if let Ok(cache) = self.calendars.lock() {
            if let Some(cal) = cache.get(freq) {
                return Ok(Arc::clone(cal));
            }
        }

        let path = self.calendar_path(freq);
        if !path.is_file() {
            return Err(ProviderError::CalendarNotFound {
                freq: freq.to_string(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let mut calendar = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let ts = parse_timestamp(line).ok_or_else(|| {
                ProviderError::Malformed(format!(
                    "{}: bad timestamp '{line}' on line {}",
                    path.display(),
                    i + 1
                ))
            })?;
            calendar.push(ts);
        }

        let calendar = Arc::new(calendar);
        if let Ok(mut cache) = self.calendars.lock() {
            cache.insert(freq.to_string(), Arc::clone(&calendar));
        }
        Ok(calendar)
    }
}

impl MarketDataProvider for BinDirProvider {
    fn name(&self) -> &str {
        "bin-dir"
    }

    fn list_instruments(&self, market: &str, _freq: &str) -> Result<Vec<String>, ProviderError> {
        let path = self.instruments_path(market);
        if !path.is_file() {
            return Err(ProviderError::UniverseNotFound {
                market: market.to_string(),
            });
        }

        let content = fs::read_to_string(&path)?;
        Ok(content
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .map(|s| s.to_string())
            .collect())
    }

    fn features(
        &self,
        instrument: &str,
        fields: &[&str],
        freq: &str,
    ) -> Result<ProviderFrame, ProviderError> {
        let dir = self.feature_dir(instrument);
        if !dir.is_dir() {
            return Err(ProviderError::InstrumentNotFound {
                symbol: instrument.to_string(),
            });
        }

        let calendar = self.calendar(freq)?;

        let mut spans: Vec<(&str, FeatureSpan)> = Vec::new();
        for field in fields {
            let stem = field.trim_start_matches('$');
            let path = dir.join(format!("{stem}.{freq}.bin"));
            if !path.is_file() {
                continue;
            }
            let span = read_feature(&path)?;
            let end = span.start.checked_add(span.values.len());
            if end.map_or(true, |end| end > calendar.len()) {
                return Err(ProviderError::Malformed(format!(
                    "{}: {} values from index {} overrun a calendar of {}",
                    path.display(),
                    span.values.len(),
                    span.start,
                    calendar.len()
                )));
            }
            spans.push((*field, span));
        }

        let Some(first) = spans.iter().map(|(_, s)| s.start).min() else {
            return Ok(ProviderFrame::default());
        };
        let end = spans
            .iter()
            .map(|(_, s)| s.start + s.values.len())
            .max()
            .unwrap_or(first);

        let timestamps = calendar[first..end].to_vec();
        let columns = spans
            .into_iter()
            .map(|(field, span)| {
                let values = (first..end)
                    .map(|i| {
                        i.checked_sub(span.start)
                            .and_then(|offset| span.values.get(offset))
                            .map(|v| *v as f64)
                    })
                    .collect();
                (field.to_string(), values)
            })
            .collect();

        Ok(ProviderFrame {
            timestamps,
            columns,
        })
    }
}

fn read_feature(path: &Path) -> Result<FeatureSpan, ProviderError> {
    let bytes = fs::read(path)?;
    if bytes.len() < 4 || bytes.len() % 4 != 0 {
        return Err(ProviderError::Malformed(format!(
            "{}: {} bytes is not a whole number of f32 values",
            path.display(),
            bytes.len()
        )));
    }

    let mut floats = bytes.chunks_exact(4).map(|chunk| {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(chunk);
        f32::from_le_bytes(buf)
    });

    let raw = floats.next().unwrap_or(f32::NAN);
    // Above u32::MAX the cast would saturate instead of failing.
    if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 || raw > u32::MAX as f32 {
        return Err(ProviderError::Malformed(format!(
            "{}: invalid start index {raw}",
            path.display()
        )));
    }

    Ok(FeatureSpan {
        start: raw as usize,
        values: floats.collect(),
    })
}

/// Encode a feature file. Used by tests and fixture tooling.
pub fn encode_feature(start: usize, values: &[f32]) -> Vec<u8> {
    std::iter::once(start as f32)
        .chain(values.iter().copied())
        .flat_map(f32::to_le_bytes)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("calendars")).unwrap();
        fs::create_dir_all(root.join("instruments")).unwrap();
        fs::create_dir_all(root.join("features/2330")).unwrap();

        fs::write(
            root.join("calendars/day.txt"),
            "2024-01-02\n2024-01-03\n2024-01-04\n2024-01-05\n",
        )
        .unwrap();
        fs::write(
            root.join("instruments/tw50.txt"),
            "2330\t2024-01-02\t2024-01-05\n2317\t2024-01-02\t2024-01-05\n",
        )
        .unwrap();
        fs::write(
            root.join("features/2330/close.day.bin"),
            encode_feature(1, &[10.0, 11.0, 12.0]),
        )
        .unwrap();
        fs::write(
            root.join("features/2330/factor.day.bin"),
            encode_feature(2, &[f32::NAN, 1.0]),
        )
        .unwrap();
        dir
    }

    #[test]
    fn lists_instruments_and_reports_missing_markets() {
        let dir = fixture();
        let provider = BinDirProvider::new(dir.path());

        assert_eq!(
            provider.list_instruments("tw50", "day").unwrap(),
            vec!["2330", "2317"]
        );
        assert!(matches!(
            provider.list_instruments("all", "day"),
            Err(ProviderError::UniverseNotFound { .. })
        ));
    }

    #[test]
    fn aligns_fields_on_the_calendar() {
        let dir = fixture();
        let provider = BinDirProvider::new(dir.path());

        let frame = provider
            .features("2330", &["$close", "$factor", "$volume"], "day")
            .unwrap();

        assert_eq!(frame.timestamps.len(), 3);
        assert_eq!(frame.timestamps[0].to_string(), "2024-01-03 00:00:00");
        assert_eq!(frame.columns.len(), 2);

        let (name, close) = &frame.columns[0];
        assert_eq!(name, "$close");
        assert_eq!(close, &vec![Some(10.0), Some(11.0), Some(12.0)]);

        let (name, factor) = &frame.columns[1];
        assert_eq!(name, "$factor");
        assert_eq!(factor[0], None);
        assert!(factor[1].unwrap().is_nan());
        assert_eq!(factor[2], Some(1.0));
    }

    #[test]
    fn unknown_instrument_is_an_error() {
        let dir = fixture();
        let provider = BinDirProvider::new(dir.path());
        assert!(matches!(
            provider.features("9999", &["$close"], "day"),
            Err(ProviderError::InstrumentNotFound { .. })
        ));
    }

    #[test]
    fn overrunning_feature_is_malformed() {
        let dir = fixture();
        fs::write(
            dir.path().join("features/2330/open.day.bin"),
            encode_feature(3, &[1.0, 2.0]),
        )
        .unwrap();
        let provider = BinDirProvider::new(dir.path());
        assert!(matches!(
            provider.features("2330", &["$open"], "day"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn huge_start_index_is_malformed_not_a_panic() {
        let dir = fixture();
        let bytes: Vec<u8> = [1e20_f32, 1.0, 2.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        fs::write(dir.path().join("features/2330/open.day.bin"), bytes).unwrap();
        let provider = BinDirProvider::new(dir.path());

        assert!(matches!(
            provider.features("2330", &["$open"], "day"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn start_index_past_the_calendar_is_malformed() {
        let dir = fixture();
        fs::write(
            dir.path().join("features/2330/open.day.bin"),
            encode_feature(1_000_000, &[1.0]),
        )
        .unwrap();
        let provider = BinDirProvider::new(dir.path());

        assert!(matches!(
            provider.features("2330", &["$open"], "day"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn truncated_file_is_malformed() {
        let dir = fixture();
        let path = dir.path().join("features/2330/high.day.bin");
        fs::write(&path, [0u8, 0, 128]).unwrap();
        assert!(matches!(read_feature(&path), Err(ProviderError::Malformed(_))));
    }
}
