//! Health check configuration.
//!
//! Loaded from TOML (every key optional) and overridable field by field
//! from the CLI. Thresholds, tolerance, the factor exemption list and the
//! market fallback chain all live here so tests can set them explicitly.

use crate::error::HealthError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Index and benchmark codes that conventionally carry no adjustment factor.
pub const DEFAULT_FACTOR_EXEMPT: [&str; 5] = ["000300", "000903", "000905", "^TWII", "TWII"];

/// Markets tried in order when resolving the provider universe:
/// broad market, capital-weighted index, large-cap subset, mid-cap subset.
pub const DEFAULT_MARKETS: [&str; 4] = ["all", "twii", "tw50", "twmidcap"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Data frequency requested from a provider (`"day"`, `"1min"`, ...).
    pub frequency: String,

    /// Max absolute period-over-period change for open/high/low/close.
    pub price_change_threshold: f64,

    /// Max absolute period-over-period change for volume.
    pub volume_change_threshold: f64,

    /// Null count per column tolerated before a series is flagged.
    pub missing_data_tolerance: usize,

    /// Identifiers skipped by the missing-factor check.
    pub factor_exempt_instruments: Vec<String>,

    /// Market fallback chain for provider loading.
    pub markets: Vec<String>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            frequency: "day".into(),
            price_change_threshold: 0.5,
            volume_change_threshold: 3.0,
            missing_data_tolerance: 0,
            factor_exempt_instruments: DEFAULT_FACTOR_EXEMPT.iter().map(|s| s.to_string()).collect(),
            markets: DEFAULT_MARKETS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl HealthCheckConfig {
    /// Load a config from a TOML file and validate it.
    pub fn from_file(path: &Path) -> Result<Self, HealthError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, HealthError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HealthError> {
        check_threshold("price_change_threshold", self.price_change_threshold)?;
        check_threshold("volume_change_threshold", self.volume_change_threshold)?;
        if self.frequency.trim().is_empty() {
            return Err(HealthError::configuration("frequency must not be empty"));
        }
        if self.markets.is_empty() {
            return Err(HealthError::configuration(
                "markets must name at least one market",
            ));
        }
        Ok(())
    }
}

fn check_threshold(name: &str, value: f64) -> Result<(), HealthError> {
    if value.is_nan() || value < 0.0 {
        return Err(HealthError::configuration(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}
