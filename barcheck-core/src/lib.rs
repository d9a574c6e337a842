//! Barcheck Core — data health checks for OHLCV and adjustment-factor series.
//!
//! This crate contains:
//! - Domain types (fields, instrument series)
//! - A series store loaded from a directory of files or a market-data provider
//! - Four health checks and the engine that runs them
//! - Text and JSON report rendering

pub mod checks;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod report;

pub use checks::{CheckEngine, CheckKind, CheckReport, CheckResult, Finding, HealthCheck, HealthStatus};
pub use config::HealthCheckConfig;
pub use data::{BinDirProvider, MarketDataProvider, MarketFallback, SeriesStore};
pub use error::HealthError;
pub use report::Reporter;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the store, findings and checks can cross threads.
    ///
    /// Checks run on the rayon pool, so every check and everything it reads
    /// must be Send + Sync. If any type fails this, the build breaks here.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::InstrumentSeries>();
        require_sync::<domain::InstrumentSeries>();
        require_send::<domain::Field>();
        require_sync::<domain::Field>();

        // Store
        require_send::<data::SeriesStore>();
        require_sync::<data::SeriesStore>();
        require_send::<data::BinDirProvider>();
        require_sync::<data::BinDirProvider>();

        // Findings
        require_send::<checks::Finding>();
        require_sync::<checks::Finding>();
        require_send::<checks::CheckReport>();
        require_sync::<checks::CheckReport>();

        // Checks
        require_send::<checks::MissingDataCheck>();
        require_sync::<checks::MissingDataCheck>();
        require_send::<checks::LargeStepCheck>();
        require_sync::<checks::LargeStepCheck>();
        require_send::<checks::RequiredColumnsCheck>();
        require_sync::<checks::RequiredColumnsCheck>();
        require_send::<checks::MissingFactorCheck>();
        require_sync::<checks::MissingFactorCheck>();
        require_send::<checks::CheckEngine>();
        require_sync::<checks::CheckEngine>();
    }

    /// Architecture contract: checks see the store read-only.
    ///
    /// `HealthCheck::run` takes `&SeriesStore`, so no check can alter the
    /// data another check is about to inspect.
    #[test]
    fn health_check_trait_takes_store_by_shared_reference() {
        fn _check_trait_object_builds(
            check: &dyn HealthCheck,
            store: &SeriesStore,
        ) -> Vec<Finding> {
            check.run(store)
        }
    }
}
