//! Instrument universe resolution with an ordered market fallback chain.
//!
//! A provider may not carry every market. The chain lists market names in
//! priority order (broad market first, then narrower indices); resolution
//! tries each in turn and keeps the first one that yields instruments.

use super::provider::ProviderError;
use crate::config::DEFAULT_MARKETS;
use crate::error::HealthError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Prioritized list of markets to try when resolving the universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketFallback {
    markets: Vec<String>,
}

/// The universe that resolution settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUniverse {
    /// Market the instruments came from.
    pub market: String,
    /// Position of `market` in the chain (0 = primary).
    pub rank: usize,
    pub instruments: Vec<String>,
}

impl ResolvedUniverse {
    /// Whether a market other than the primary one was used.
    pub fn used_fallback(&self) -> bool {
        self.rank > 0
    }
}

impl MarketFallback {
    pub fn new<I, S>(markets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markets: markets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn markets(&self) -> &[String] {
        &self.markets
    }

    /// Resolve the universe, calling `list` for each market in order.
    ///
    /// A market resolves when `list` succeeds with a non-empty instrument
    /// list. Fails with `HealthError::DataUnavailable` once the chain is
    /// exhausted.
    pub fn resolve<F>(&self, mut list: F) -> Result<ResolvedUniverse, HealthError>
    where
        F: FnMut(&str) -> Result<Vec<String>, ProviderError>,
    {
        let mut tried = Vec::with_capacity(self.markets.len());

        for (rank, market) in self.markets.iter().enumerate() {
            tried.push(market.clone());
            match list(market) {
                Ok(instruments) if !instruments.is_empty() => {
                    let resolved = ResolvedUniverse {
                        market: market.clone(),
                        rank,
                        instruments: dedup_preserving_order(instruments),
                    };
                    if resolved.used_fallback() {
                        info!(
                            market = %resolved.market,
                            instruments = resolved.instruments.len(),
                            "using fallback market"
                        );
                    } else {
                        info!(
                            market = %resolved.market,
                            instruments = resolved.instruments.len(),
                            "resolved instrument universe"
                        );
                    }
                    return Ok(resolved);
                }
                Ok(_) => {
                    info!(market = %market, "market has no instruments, trying next");
                }
                Err(e) => {
                    info!(market = %market, error = %e, "market unavailable, trying next");
                }
            }
        }

        warn!(tried = %tried.join(", "), "no valid market found");
        Err(HealthError::DataUnavailable { tried })
    }
}

impl Default for MarketFallback {
    fn default() -> Self {
        Self::new(DEFAULT_MARKETS)
    }
}

fn dedup_preserving_order(instruments: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    instruments
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
