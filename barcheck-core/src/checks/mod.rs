//! Health checks over a series store.
//!
//! Each check is a `HealthCheck` producing findings for every instrument in
//! the store. `CheckEngine` wires the four checks from a config and runs one
//! or all of them, logging each outcome.

pub mod finding;
pub mod large_step;
pub mod missing_data;
pub mod missing_factor;
pub mod outcome;
pub mod required_columns;

pub use finding::{CheckKind, Finding, FindingDetail};
pub use large_step::{find_large_step, pct_changes, LargeStepCheck, StepExceedance};
pub use missing_data::MissingDataCheck;
pub use missing_factor::{ExemptionList, MissingFactorCheck};
pub use outcome::{CheckReport, CheckResult, HealthStatus};
pub use required_columns::RequiredColumnsCheck;

use crate::config::HealthCheckConfig;
use crate::data::SeriesStore;
use rayon::prelude::*;
use tracing::{info, warn};

/// One data-quality check.
///
/// Implementations are pure over the store: running twice on the same
/// store yields identical findings, in identifier order.
pub trait HealthCheck: Send + Sync {
    fn kind(&self) -> CheckKind;

    fn run(&self, store: &SeriesStore) -> Vec<Finding>;
}

/// Runs the configured checks against a store.
pub struct CheckEngine {
    checks: Vec<Box<dyn HealthCheck>>,
    parallel: bool,
}

impl CheckEngine {
    pub fn new(config: &HealthCheckConfig) -> Self {
        let checks: Vec<Box<dyn HealthCheck>> = vec![
            Box::new(MissingDataCheck::new(config.missing_data_tolerance)),
            Box::new(LargeStepCheck::new(
                config.price_change_threshold,
                config.volume_change_threshold,
            )),
            Box::new(RequiredColumnsCheck),
            Box::new(MissingFactorCheck::new(ExemptionList::new(
                config.factor_exempt_instruments.iter().cloned(),
            ))),
        ];
        Self {
            checks,
            parallel: true,
        }
    }

    /// Run checks on the rayon pool (default) or one after another.
    /// Result order is the same either way.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn kinds(&self) -> Vec<CheckKind> {
        self.checks.iter().map(|c| c.kind()).collect()
    }

    /// Run a single check.
    pub fn run(&self, kind: CheckKind, store: &SeriesStore) -> CheckResult {
        let findings = self
            .checks
            .iter()
            .find(|c| c.kind() == kind)
            .map(|c| c.run(store))
            .unwrap_or_default();
        let result = CheckResult::new(kind, findings);
        log_result(&result);
        result
    }

    /// Run every check and aggregate the results.
    pub fn run_all(&self, store: &SeriesStore) -> CheckReport {
        let run_one = |check: &Box<dyn HealthCheck>| CheckResult::new(check.kind(), check.run(store));

        let results: Vec<CheckResult> = if self.parallel {
            self.checks.par_iter().map(run_one).collect()
        } else {
            self.checks.iter().map(run_one).collect()
        };

        results.iter().for_each(log_result);

        let report = CheckReport::new(store.len(), results);
        if store.is_empty() {
            warn!("no instruments loaded, nothing was checked");
        } else if report.has_issues() {
            warn!(
                instruments = store.len(),
                failed_checks = report.failed_checks(),
                findings = report.total_findings(),
                "data health check failed"
            );
        } else {
            info!(instruments = store.len(), "all health checks passed");
        }
        report
    }
}

fn log_result(result: &CheckResult) {
    if result.passed() {
        info!(check = %result.kind, "{}", result.kind.passed_message());
    } else {
        warn!(
            check = %result.kind,
            findings = result.findings.len(),
            "{}",
            result.kind.failed_message()
        );
    }
}
