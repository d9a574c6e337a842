//! Check results and the aggregated report for one run.

use super::finding::{CheckKind, Finding};
use serde::{Deserialize, Serialize};

/// Findings produced by one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub kind: CheckKind,
    pub findings: Vec<Finding>,
}

impl CheckResult {
    pub fn new(kind: CheckKind, findings: Vec<Finding>) -> Self {
        Self { kind, findings }
    }

    /// The findings, or `None` when the check passed.
    pub fn findings(&self) -> Option<&[Finding]> {
        if self.findings.is_empty() {
            None
        } else {
            Some(&self.findings)
        }
    }

    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Overall verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Passed,
    Failed,
    /// The store held no instruments, so nothing was checked.
    NoData,
}

/// Every check's findings for one run over one series store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub instruments_checked: usize,
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    pub fn new(instruments_checked: usize, results: Vec<CheckResult>) -> Self {
        Self {
            instruments_checked,
            results,
        }
    }

    /// True iff any check produced at least one finding.
    pub fn has_issues(&self) -> bool {
        self.results.iter().any(|r| !r.passed())
    }

    pub fn status(&self) -> HealthStatus {
        if self.instruments_checked == 0 {
            HealthStatus::NoData
        } else if self.has_issues() {
            HealthStatus::Failed
        } else {
            HealthStatus::Passed
        }
    }

    pub fn result(&self, kind: CheckKind) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.kind == kind)
    }

    pub fn total_findings(&self) -> usize {
        self.results.iter().map(|r| r.findings.len()).sum()
    }

    pub fn failed_checks(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::finding::FindingDetail;

    fn factor_finding() -> Finding {
        Finding::new(
            "2330",
            FindingDetail::MissingFactor {
                missing_factor_col: true,
                missing_factor_data: false,
            },
        )
    }

    #[test]
    fn empty_result_reports_no_findings() {
        let r = CheckResult::new(CheckKind::MissingData, Vec::new());
        assert!(r.passed());
        assert!(r.findings().is_none());
    }

    #[test]
    fn status_reflects_findings_and_data() {
        let clean = CheckReport::new(3, vec![CheckResult::new(CheckKind::MissingData, vec![])]);
        assert_eq!(clean.status(), HealthStatus::Passed);
        assert!(!clean.has_issues());

        let dirty = CheckReport::new(
            3,
            vec![
                CheckResult::new(CheckKind::MissingData, vec![]),
                CheckResult::new(CheckKind::MissingFactor, vec![factor_finding()]),
            ],
        );
        assert_eq!(dirty.status(), HealthStatus::Failed);
        assert_eq!(dirty.total_findings(), 1);
        assert_eq!(dirty.failed_checks(), 1);

        let empty = CheckReport::new(0, vec![]);
        assert_eq!(empty.status(), HealthStatus::NoData);
        assert!(!empty.has_issues());
    }
}
