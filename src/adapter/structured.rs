//! Adapters for tools that emit machine-readable JSON.
//!
//! Exit codes never decide the outcome here: bandit exits 1 when it finds
//! issues, safety exits 64, trufflehog exits 0 either way. The only thing
//! that makes these runs a `tool_error` is output we cannot parse, and in
//! that case the offending text is preserved in the result instead of
//! being swallowed.

use crate::adapter::ToolAdapter;
use crate::model::{Finding, RawExecution, ScanResult, Severity, ToolFamily};
use serde::Deserialize;

/// Message for a JSON tool whose stdout cannot be parsed. Prefers the
/// stdout itself so the operator sees what the tool actually said.
fn unparseable(raw: &RawExecution) -> String {
    let stdout = raw.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    let stderr = raw.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    "no output".to_string()
}

// ---------------------------------------------------------------------------
// bandit

#[derive(Debug, Deserialize)]
struct BanditReport {
    #[serde(default)]
    results: Vec<BanditIssue>,
}

#[derive(Debug, Deserialize)]
struct BanditIssue {
    filename: Option<String>,
    line_number: Option<u32>,
    #[serde(default)]
    issue_text: String,
    #[serde(default)]
    issue_severity: String,
    test_id: Option<String>,
    more_info: Option<String>,
}

/// Bandit (`bandit -r <path> -f json`). The report always lands on
/// stdout; `results` is empty on a clean tree.
pub struct BanditAdapter;

impl BanditAdapter {
    fn parse(&self, raw: &RawExecution) -> Result<Vec<Finding>, String> {
        let report: BanditReport =
            serde_json::from_str(&raw.stdout).map_err(|_| unparseable(raw))?;

        let mut findings = Vec::with_capacity(report.results.len());
        for issue in report.results {
            let title = if issue.issue_text.trim().is_empty() {
                match &issue.test_id {
                    Some(id) => format!("{id} triggered"),
                    None => "issue reported without a description".to_string(),
                }
            } else {
                issue.issue_text.clone()
            };
            let mut finding = Finding::new(
                issue.filename.unwrap_or_else(|| "<unknown>".to_string()),
                title,
                Severity::from_label(&issue.issue_severity),
            )
            .map_err(|e| e.to_string())?;
            if let Some(line) = issue.line_number {
                finding = finding.with_line(line);
            }
            if let Some(test_id) = issue.test_id {
                finding = finding.with_rule_id(test_id);
            }
            if let Some(url) = issue.more_info {
                finding = finding.with_detail_url(url);
            }
            findings.push(finding);
        }
        Ok(findings)
    }
}

impl ToolAdapter for BanditAdapter {
    fn adapt(&self, raw: &RawExecution) -> ScanResult {
        match self.parse(raw) {
            Ok(findings) => {
                ScanResult::with_findings(&raw.tool_id, ToolFamily::Vulnerability, findings)
            }
            Err(message) => {
                ScanResult::tool_error(&raw.tool_id, ToolFamily::Vulnerability, message)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// safety

#[derive(Debug, Deserialize)]
struct SafetyReport {
    #[serde(default)]
    vulnerabilities: Vec<SafetyVulnerability>,
}

#[derive(Debug, Deserialize)]
struct SafetyVulnerability {
    #[serde(default)]
    package_name: String,
    analyzed_version: Option<String>,
    vulnerability_id: Option<String>,
    #[serde(default)]
    advisory: String,
    more_info_url: Option<String>,
    // Often null in the report; null maps to Unknown.
    severity: Option<String>,
}

/// Safety (`safety check --file <requirements> --json`). Scans a pinned
/// requirements file against the advisory database.
pub struct SafetyAdapter;

impl SafetyAdapter {
    fn parse(&self, raw: &RawExecution) -> Result<Vec<Finding>, String> {
        let report: SafetyReport =
            serde_json::from_str(&raw.stdout).map_err(|_| unparseable(raw))?;

        let mut findings = Vec::with_capacity(report.vulnerabilities.len());
        for vuln in report.vulnerabilities {
            let location = match &vuln.analyzed_version {
                Some(version) => format!("{}@{}", vuln.package_name, version),
                None => vuln.package_name.clone(),
            };
            let title = if vuln.advisory.trim().is_empty() {
                format!("known vulnerability in {}", vuln.package_name)
            } else {
                vuln.advisory.clone()
            };
            let severity = vuln
                .severity
                .as_deref()
                .map(Severity::from_label)
                .unwrap_or(Severity::Unknown);
            let mut finding =
                Finding::new(location, title, severity).map_err(|e| e.to_string())?;
            if let Some(id) = vuln.vulnerability_id {
                finding = finding.with_rule_id(id);
            }
            if let Some(url) = vuln.more_info_url {
                finding = finding.with_detail_url(url);
            }
            findings.push(finding);
        }
        Ok(findings)
    }
}

impl ToolAdapter for SafetyAdapter {
    fn adapt(&self, raw: &RawExecution) -> ScanResult {
        if raw.stdout.trim().is_empty() {
            return ScanResult::no_output(&raw.tool_id, ToolFamily::Vulnerability, "empty stdout");
        }
        match self.parse(raw) {
            Ok(findings) => {
                ScanResult::with_findings(&raw.tool_id, ToolFamily::Vulnerability, findings)
            }
            Err(message) => {
                ScanResult::tool_error(&raw.tool_id, ToolFamily::Vulnerability, message)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// trufflehog

#[derive(Debug, Deserialize)]
struct TrufflehogRecord {
    #[serde(rename = "SourceMetadata")]
    source_metadata: Option<TrufflehogMetadata>,
    #[serde(rename = "DetectorName", default)]
    detector_name: String,
    #[serde(rename = "Verified", default)]
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct TrufflehogMetadata {
    #[serde(rename = "Data")]
    data: Option<TrufflehogSource>,
}

#[derive(Debug, Deserialize)]
struct TrufflehogSource {
    #[serde(rename = "Git")]
    git: Option<TrufflehogLocation>,
    #[serde(rename = "Filesystem")]
    filesystem: Option<TrufflehogLocation>,
}

#[derive(Debug, Deserialize)]
struct TrufflehogLocation {
    file: Option<String>,
    line: Option<u32>,
}

/// Trufflehog v3 (`trufflehog git file://<repo> --json`). One JSON record
/// per line on stdout; nothing on stdout means no secrets.
pub struct TrufflehogAdapter;

impl TrufflehogAdapter {
    fn parse(&self, raw: &RawExecution) -> Result<Vec<Finding>, String> {
        let mut findings = Vec::new();
        for line in raw.stdout.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: TrufflehogRecord = serde_json::from_str(line)
                .map_err(|_| format!("unrecognized line in output: {line}"))?;

            let location = record
                .source_metadata
                .as_ref()
                .and_then(|m| m.data.as_ref())
                .and_then(|d| d.git.as_ref().or(d.filesystem.as_ref()));
            let file = location
                .and_then(|l| l.file.clone())
                .unwrap_or_else(|| "<repository>".to_string());
            let line_number = location.and_then(|l| l.line);

            let title = if record.detector_name.is_empty() {
                "secret detected".to_string()
            } else {
                format!("{} secret detected", record.detector_name)
            };
            let severity = if record.verified {
                Severity::Critical
            } else {
                Severity::High
            };
            let mut finding =
                Finding::new(file, title, severity).map_err(|e| e.to_string())?;
            if let Some(line) = line_number {
                finding = finding.with_line(line);
            }
            findings.push(finding);
        }
        Ok(findings)
    }
}

impl ToolAdapter for TrufflehogAdapter {
    fn adapt(&self, raw: &RawExecution) -> ScanResult {
        if raw.stdout.trim().is_empty() {
            // No records means no secrets, but only if the scan itself ran.
            if raw.exit_code == Some(0) {
                return ScanResult::clean(&raw.tool_id, ToolFamily::Secret);
            }
            return ScanResult::tool_error(&raw.tool_id, ToolFamily::Secret, unparseable(raw));
        }
        match self.parse(raw) {
            Ok(findings) => ScanResult::with_findings(&raw.tool_id, ToolFamily::Secret, findings),
            Err(message) => ScanResult::tool_error(&raw.tool_id, ToolFamily::Secret, message),
        }
    }
}
