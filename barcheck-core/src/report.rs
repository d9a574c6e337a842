//! Human-readable and JSON rendering of a check report.

use crate::checks::{CheckKind, CheckReport, CheckResult, Finding, FindingDetail, HealthStatus};
use crate::domain::{format_timestamp, Field};
use serde::Serialize;

pub struct Reporter;

#[derive(Serialize)]
struct JsonReport<'a> {
    status: HealthStatus,
    #[serde(flatten)]
    report: &'a CheckReport,
}

impl Reporter {
    /// Plain-text report: one PASS/FAIL line per check, a table of findings
    /// under each failing check, and a closing summary line.
    pub fn render_text(&self, report: &CheckReport) -> String {
        let mut out = format!(
            "Data health check: {} instrument(s)\n",
            report.instruments_checked
        );

        if report.status() == HealthStatus::NoData {
            out.push_str("No instruments were loaded, nothing was checked.\n");
            return out;
        }

        for result in &report.results {
            out.push('\n');
            out.push_str(&render_result(result));
        }

        out.push('\n');
        match report.status() {
            HealthStatus::Passed => out.push_str(&format!(
                "Summary: PASSED ({} check(s), no findings)\n",
                report.results.len()
            )),
            HealthStatus::Failed => out.push_str(&format!(
                "Summary: FAILED ({} of {} check(s), {} finding(s))\n",
                report.failed_checks(),
                report.results.len(),
                report.total_findings()
            )),
            HealthStatus::NoData => {}
        }
        out
    }

    pub fn render_json(&self, report: &CheckReport) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&JsonReport {
            status: report.status(),
            report,
        })
    }
}

fn render_result(result: &CheckResult) -> String {
    let Some(findings) = result.findings() else {
        return format!("[PASS] {}: {}\n", result.kind, result.kind.passed_message());
    };

    let mut out = format!("[FAIL] {}: {}\n", result.kind, result.kind.failed_message());
    let (headers, rows) = table_for(result.kind, findings);
    out.push_str(&render_table(&headers, &rows));
    out
}

fn table_for(kind: CheckKind, findings: &[Finding]) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let headers = match kind {
        CheckKind::MissingData => vec!["instrument", "open", "high", "low", "close", "volume"],
        CheckKind::LargeStepChange => vec!["instrument", "field", "timestamp", "pct_change"],
        CheckKind::MissingRequiredColumn => vec!["instrument", "missing"],
        CheckKind::MissingFactor => {
            vec!["instrument", "missing_factor_col", "missing_factor_data"]
        }
    };

    let rows = findings
        .iter()
        .map(|finding| {
            let mut row = vec![finding.instrument.clone()];
            match &finding.detail {
                FindingDetail::MissingData { .. } => {
                    // "-" marks a column the series does not have.
                    row.extend(Field::OHLCV.into_iter().map(|field| {
                        finding
                            .null_count(field)
                            .map_or_else(|| "-".to_string(), |n| n.to_string())
                    }));
                }
                FindingDetail::LargeStepChange {
                    field,
                    timestamp,
                    pct_change,
                } => {
                    row.push(field.to_string());
                    row.push(format_timestamp(timestamp));
                    row.push(format!("{pct_change:.4}"));
                }
                FindingDetail::MissingRequiredColumn { missing } => {
                    let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
                    row.push(names.join(", "));
                }
                FindingDetail::MissingFactor {
                    missing_factor_col,
                    missing_factor_data,
                } => {
                    row.push(missing_factor_col.to_string());
                    row.push(missing_factor_data.to_string());
                }
            }
            row
        })
        .collect();

    (headers, rows)
}

/// Left-aligned columns, two-space indent, two spaces between columns.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers.to_vec());
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}
