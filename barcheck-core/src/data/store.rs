//! Series store: every loaded instrument series, keyed by identifier.
//!
//! Built once from exactly one source (a directory of per-instrument files
//! or a market-data provider) and read-only afterwards. Per-instrument load
//! failures are logged and the instrument is skipped; only a missing or
//! conflicting source, or an unresolvable universe, fails the build.

use super::ingest::{self, frame_to_series, identifier_for, FileFormat, LoadError};
use super::provider::MarketDataProvider;
use super::universe::MarketFallback;
use crate::domain::{Field, InstrumentSeries, Symbol};
use crate::error::HealthError;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the store's series came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    Directory(PathBuf),
    Provider {
        provider: String,
        market: String,
        frequency: String,
    },
    InMemory,
}

#[derive(Debug, Clone)]
pub struct SeriesStore {
    series: BTreeMap<Symbol, InstrumentSeries>,
    source: StoreSource,
}

impl SeriesStore {
    pub fn builder() -> SeriesStoreBuilder {
        SeriesStoreBuilder::default()
    }

    /// Wrap already-loaded series. A repeated identifier replaces the earlier one.
    pub fn from_series(series: impl IntoIterator<Item = InstrumentSeries>) -> Self {
        Self {
            series: series
                .into_iter()
                .map(|s| (s.identifier().to_string(), s))
                .collect(),
            source: StoreSource::InMemory,
        }
    }

    /// Load every `*.csv` / `*.parquet` file in `dir`.
    pub fn from_directory(dir: &Path, parallel: bool) -> Result<Self, HealthError> {
        if !dir.is_dir() {
            return Err(HealthError::configuration(format!(
                "{} should be a directory",
                dir.display()
            )));
        }

        let files = instrument_files(dir)?;
        info!(dir = %dir.display(), files = files.len(), "loading instrument files");

        let results = load_each(&files, parallel, |(identifier, path)| {
            (identifier.clone(), ingest::load_file(path, identifier))
        });

        Ok(Self {
            series: collect_loaded(results),
            source: StoreSource::Directory(dir.to_path_buf()),
        })
    }

    /// Resolve a universe through `markets`, then load every instrument in it.
    pub fn from_provider(
        provider: &dyn MarketDataProvider,
        frequency: &str,
        markets: &MarketFallback,
        parallel: bool,
    ) -> Result<Self, HealthError> {
        let universe = markets.resolve(|market| provider.list_instruments(market, frequency))?;

        let fields: Vec<&str> = Field::ALL.iter().map(|f| f.provider_name()).collect();
        info!(
            provider = provider.name(),
            market = %universe.market,
            instruments = universe.instruments.len(),
            "loading instrument data"
        );

        let results = load_each(&universe.instruments, parallel, |instrument| {
            let loaded = provider
                .features(instrument, &fields, frequency)
                .map_err(LoadError::from)
                .and_then(|frame| frame_to_series(frame, instrument));
            (instrument.clone(), loaded)
        });

        Ok(Self {
            series: collect_loaded(results),
            source: StoreSource::Provider {
                provider: provider.name().to_string(),
                market: universe.market,
                frequency: frequency.to_string(),
            },
        })
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&InstrumentSeries> {
        self.series.get(identifier)
    }

    /// Series in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &InstrumentSeries> {
        self.series.values()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    pub fn source(&self) -> &StoreSource {
        &self.source
    }

    /// Market the universe was resolved from, for provider-backed stores.
    pub fn market(&self) -> Option<&str> {
        match &self.source {
            StoreSource::Provider { market, .. } => Some(market),
            _ => None,
        }
    }
}

/// Collects construction arguments; `build` enforces that exactly one
/// source was given.
pub struct SeriesStoreBuilder {
    directory: Option<PathBuf>,
    provider: Option<Box<dyn MarketDataProvider>>,
    frequency: String,
    markets: MarketFallback,
    parallel: bool,
}

impl Default for SeriesStoreBuilder {
    fn default() -> Self {
        Self {
            directory: None,
            provider: None,
            frequency: "day".into(),
            markets: MarketFallback::default(),
            parallel: true,
        }
    }
}

impl SeriesStoreBuilder {
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    pub fn provider(mut self, provider: Box<dyn MarketDataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = frequency.into();
        self
    }

    pub fn markets(mut self, markets: MarketFallback) -> Self {
        self.markets = markets;
        self
    }

    /// Load instruments on the rayon pool (default) or one at a time.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(self) -> Result<SeriesStore, HealthError> {
        match (self.directory, self.provider) {
            (Some(_), Some(_)) => Err(HealthError::configuration(
                "only one of a data directory or a provider should be provided",
            )),
            (None, None) => Err(HealthError::configuration(
                "one of a data directory or a provider should be provided",
            )),
            (Some(dir), None) => SeriesStore::from_directory(&dir, self.parallel),
            (None, Some(provider)) => SeriesStore::from_provider(
                provider.as_ref(),
                &self.frequency,
                &self.markets,
                self.parallel,
            ),
        }
    }
}

/// Supported files in `dir`, sorted by path, paired with their identifiers.
/// When two files share a stem (AAPL.csv, AAPL.parquet) the first wins.
fn instrument_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, HealthError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && FileFormat::from_path(p).is_some())
        .collect();
    paths.sort();

    let mut files: Vec<(String, PathBuf)> = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(identifier) = identifier_for(&path) else {
            warn!(path = %path.display(), "skipping file with a non UTF-8 name");
            continue;
        };
        if files.iter().any(|(id, _)| *id == identifier) {
            warn!(path = %path.display(), instrument = %identifier, "duplicate instrument file ignored");
            continue;
        }
        files.push((identifier, path));
    }
    Ok(files)
}

fn load_each<T, F>(
    items: &[T],
    parallel: bool,
    load: F,
) -> Vec<(String, Result<InstrumentSeries, LoadError>)>
where
    T: Sync,
    F: Fn(&T) -> (String, Result<InstrumentSeries, LoadError>) + Sync + Send,
{
    if parallel {
        items.par_iter().map(&load).collect()
    } else {
        items.iter().map(&load).collect()
    }
}

fn collect_loaded(
    results: Vec<(String, Result<InstrumentSeries, LoadError>)>,
) -> BTreeMap<Symbol, InstrumentSeries> {
    let total = results.len();
    let mut series = BTreeMap::new();

    for (identifier, result) in results {
        match result {
            Ok(s) => {
                debug!(instrument = %identifier, rows = s.len(), "loaded");
                series.insert(identifier, s);
            }
            Err(e) => {
                warn!(instrument = %identifier, error = %e, "failed to load data, skipping");
            }
        }
    }

    info!(
        loaded = series.len(),
        skipped = total - series.len(),
        "series store ready"
    );
    series
}
