//! Field: canonical column names for instrument series.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A canonical per-period column of an instrument series.
///
/// Variant order matches the column order used in reports
/// (`open, high, low, close, volume, factor`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
    Factor,
}

impl Field {
    /// Every canonical column.
    pub const ALL: [Field; 6] = [
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
        Field::Volume,
        Field::Factor,
    ];

    /// The five required OHLCV columns.
    pub const OHLCV: [Field; 5] = [
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
        Field::Volume,
    ];

    /// Price-like columns, subject to the price change threshold.
    pub const PRICE: [Field; 4] = [Field::Open, Field::High, Field::Low, Field::Close];

    /// Canonical column name (`"open"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Open => "open",
            Field::High => "high",
            Field::Low => "low",
            Field::Close => "close",
            Field::Volume => "volume",
            Field::Factor => "factor",
        }
    }

    /// Provider-native field expression (`"$open"`).
    pub fn provider_name(&self) -> &'static str {
        match self {
            Field::Open => "$open",
            Field::High => "$high",
            Field::Low => "$low",
            Field::Close => "$close",
            Field::Volume => "$volume",
            Field::Factor => "$factor",
        }
    }

    /// Look up a canonical column by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Field> {
        let name = name.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(name))
    }

    /// Map a provider-native name (`"$close"`) to its canonical column.
    pub fn from_provider_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.provider_name() == name)
    }

    pub fn is_price(&self) -> bool {
        Field::PRICE.contains(self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
