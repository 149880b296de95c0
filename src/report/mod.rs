//! Report rendering: normalized results in, text out.
//!
//! Rendering is a pure function of the result model. The same input
//! always produces the same output; timestamps are data carried by the
//! batch, never read from the clock here.

pub mod json;
pub mod progress;
pub mod terminal;

use crate::model::{ScanResult, ScanStatus, Severity};
use serde::Serialize;

pub trait Reporter {
    fn report(&self, result: &ScanResult) -> String;
    fn report_batch(&self, batch: &BatchReport) -> String;
}

/// One whole sweep: every per-tool result plus the aggregate summary.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub version: String,
    pub started_at: String,
    pub target: String,
    pub results: Vec<ScanResult>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn new(
        target: impl Into<String>,
        started_at: impl Into<String>,
        results: Vec<ScanResult>,
    ) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: started_at.into(),
            target: target.into(),
            results,
            summary,
        }
    }
}

/// Machine-checkable aggregate over a batch, for CI gating.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub tools_run: usize,
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
    pub info: usize,
    pub unknown: usize,
    pub findings_total: usize,
    /// Tools that ended in `tool_error`. A tool with no output is not
    /// counted here; it neither failed nor found anything.
    pub failed_tools: Vec<String>,
    pub passed: bool,
}

impl BatchSummary {
    pub fn from_results(results: &[ScanResult]) -> Self {
        let mut summary = Self {
            tools_run: results.len(),
            critical: 0,
            high: 0,
            moderate: 0,
            low: 0,
            info: 0,
            unknown: 0,
            findings_total: 0,
            failed_tools: Vec::new(),
            passed: true,
        };
        for result in results {
            summary.critical += result.count(Severity::Critical);
            summary.high += result.count(Severity::High);
            summary.moderate += result.count(Severity::Moderate);
            summary.low += result.count(Severity::Low);
            summary.info += result.count(Severity::Info);
            summary.unknown += result.count(Severity::Unknown);
            summary.findings_total += result.findings().len();
            if result.status() == ScanStatus::ToolError {
                summary.failed_tools.push(result.tool_id().to_string());
            }
        }
        summary.passed = summary.findings_total == 0 && summary.failed_tools.is_empty();
        summary
    }

    /// Process exit code: 0 all clean, 1 findings, 2 any tool failed.
    pub fn exit_code(&self) -> u8 {
        if !self.failed_tools.is_empty() {
            2
        } else if self.findings_total > 0 {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolFamily;
    use crate::test_utils::fixtures::findings_result;

    #[test]
    fn test_summary_counts_across_results() {
        let results = vec![
            findings_result("bandit", &[Severity::High, Severity::Critical]),
            findings_result("pylint", &[Severity::Low, Severity::High]),
            ScanResult::clean("mypy", ToolFamily::Diagnostic),
        ];
        let summary = BatchSummary::from_results(&results);

        assert_eq!(summary.tools_run, 3);
        assert_eq!(summary.findings_total, 4);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.low, 1);
        assert!(summary.failed_tools.is_empty());
        assert!(!summary.passed);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_failed_tool_dominates_exit_code() {
        let results = vec![
            findings_result("bandit", &[Severity::High]),
            ScanResult::tool_error("safety", ToolFamily::Vulnerability, "boom"),
        ];
        let summary = BatchSummary::from_results(&results);

        assert_eq!(summary.failed_tools, vec!["safety"]);
        assert!(!summary.passed);
        assert_eq!(summary.exit_code(), 2);
    }

    #[test]
    fn test_all_clean_passes() {
        let results = vec![
            ScanResult::clean("bandit", ToolFamily::Vulnerability),
            ScanResult::clean("mypy", ToolFamily::Diagnostic),
        ];
        let summary = BatchSummary::from_results(&results);
        assert!(summary.passed);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_no_output_does_not_fail_the_batch() {
        let results = vec![ScanResult::no_output(
            "safety",
            ToolFamily::Vulnerability,
            "no output",
        )];
        let summary = BatchSummary::from_results(&results);
        assert!(summary.passed);
        assert!(summary.failed_tools.is_empty());
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_empty_batch_passes_with_zero_tools() {
        let summary = BatchSummary::from_results(&[]);
        assert_eq!(summary.tools_run, 0);
        assert!(summary.passed);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_batch_report_serialization() {
        let results = vec![findings_result("bandit", &[Severity::High])];
        let report = BatchReport::new("/srv/app", "2026-02-01T09:00:00Z", results);
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();

        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["target"], "/srv/app");
        assert_eq!(json["started_at"], "2026-02-01T09:00:00Z");
        assert_eq!(json["summary"]["high"], 1);
        assert_eq!(json["summary"]["passed"], false);
        assert_eq!(json["results"][0]["tool_id"], "bandit");
    }
}
