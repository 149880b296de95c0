use crate::model::ScanResult;
use crate::report::{BatchReport, Reporter};

pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for JsonReporter {
    fn report(&self, result: &ScanResult) -> String {
        serde_json::to_string_pretty(result)
            .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize result: {}"}}"#, e))
    }

    fn report_batch(&self, batch: &BatchReport) -> String {
        serde_json::to_string_pretty(batch)
            .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize report: {}"}}"#, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Finding, Severity, ToolFamily};

    #[test]
    fn test_json_result_structure() {
        let findings = vec![
            Finding::new("src/app.py", "Possible hardcoded password", Severity::High)
                .unwrap()
                .with_line(12)
                .with_rule_id("B105"),
        ];
        let result = ScanResult::with_findings("bandit", ToolFamily::Vulnerability, findings);
        let output = JsonReporter::new().report(&result);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["tool_id"], "bandit");
        assert_eq!(parsed["status"], "findings");
        assert_eq!(parsed["findings"][0]["rule_id"], "B105");
        assert_eq!(parsed["findings"][0]["severity"], "high");
        assert_eq!(parsed["summary_counts"]["high"], 1);
    }

    #[test]
    fn test_json_batch_structure() {
        let batch = BatchReport::new(
            "/srv/app",
            "2026-02-01T09:00:00Z",
            vec![
                ScanResult::clean("mypy", ToolFamily::Diagnostic),
                ScanResult::tool_error("safety", ToolFamily::Vulnerability, "Timed out after 300s"),
            ],
        );
        let output = JsonReporter::new().report_batch(&batch);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["summary"]["tools_run"], 2);
        assert_eq!(parsed["summary"]["failed_tools"][0], "safety");
        assert_eq!(parsed["summary"]["passed"], false);
        assert_eq!(parsed["results"][1]["raw_message"], "Timed out after 300s");
    }

    #[test]
    #[allow(clippy::default_constructed_unit_structs)]
    fn test_json_default_trait() {
        let reporter = JsonReporter::default();
        let result = ScanResult::clean("bandit", ToolFamily::Vulnerability);
        let output = reporter.report(&result);
        assert!(output.contains("\"status\": \"clean\""));
    }
}
