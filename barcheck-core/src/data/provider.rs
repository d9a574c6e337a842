//! Market-data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over research data backends (the
//! on-disk binary layout, an in-memory fixture, ...) so the store can resolve a
//! universe and pull per-instrument frames without knowing where they live.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Structured error types for provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("instrument universe '{market}' not found")]
    UniverseNotFound { market: String },

    #[error("no calendar for frequency '{freq}'")]
    CalendarNotFound { freq: String },

    #[error("instrument not found: {symbol}")]
    InstrumentNotFound { symbol: String },

    #[error("malformed provider data: {0}")]
    Malformed(String),

    #[error("provider I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A per-instrument frame as the provider returns it.
///
/// Column names are provider-native (`"$close"`); the store maps them to
/// canonical fields and drops anything it does not recognize.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderFrame {
    pub timestamps: Vec<NaiveDateTime>,
    pub columns: Vec<(String, Vec<Option<f64>>)>,
}

/// Trait for market-data providers.
///
/// Any process-wide initialization the backend needs must have happened
/// before the provider is handed to the store; the store only calls these
/// methods.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Instruments belonging to `market` at frequency `freq`.
    fn list_instruments(&self, market: &str, freq: &str) -> Result<Vec<String>, ProviderError>;

    /// Fetch the requested provider-native fields for one instrument.
    fn features(
        &self,
        instrument: &str,
        fields: &[&str],
        freq: &str,
    ) -> Result<ProviderFrame, ProviderError>;
}
