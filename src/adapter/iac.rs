//! Adapter for checkov's compact text output.
//!
//! Checkov prints one block per failed check:
//!
//! ```text
//! Check: CKV_AWS_20: "S3 Bucket allows public READ access."
//!     FAILED for resource: aws_s3_bucket.data
//!     File: /main.tf:1-13
//!     Guide: https://docs.prismacloud.io/...
//! ```
//!
//! plus a `Passed checks: N, Failed checks: M, Skipped checks: K`
//! summary line. Checkov attaches no severity, so every finding here is
//! `Unknown`. An unparseable line range degrades to a finding without
//! line numbers, never to a dropped finding.

use crate::adapter::ToolAdapter;
use crate::model::{Finding, RawExecution, ScanResult, Severity, ToolFamily};
use regex::Regex;
use std::sync::LazyLock;

static CHECKOV_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Passed checks: (\d+), Failed checks: (\d+), Skipped checks: (\d+)").unwrap()
});

/// `Check: CKV_AWS_20: "title"` → (check id, unquoted title).
fn parse_check_line(line: &str) -> Option<(String, String)> {
    let rest = line.trim().strip_prefix("Check: ")?;
    let (id, title) = rest.split_once(": ")?;
    let title = title.trim().trim_matches('"').to_string();
    if title.is_empty() {
        return None;
    }
    Some((id.trim().to_string(), title))
}

/// `File: /main.tf:1-13` → (path, start line, end line).
fn parse_file_line(line: &str) -> Option<(String, Option<u32>, Option<u32>)> {
    let rest = line.trim().strip_prefix("File: ")?;
    let Some((path, range)) = rest.rsplit_once(':') else {
        return Some((rest.trim().to_string(), None, None));
    };
    if range.is_empty() || !range.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        // The trailing segment is not a line range; keep the whole path.
        return Some((rest.trim().to_string(), None, None));
    }
    let (start, end) = match range.split_once('-') {
        Some((s, e)) => (s.parse().ok(), e.parse().ok()),
        None => (range.parse().ok(), None),
    };
    Some((path.trim().to_string(), start, end))
}

fn parse_guide_line(line: &str) -> Option<String> {
    let rest = line.trim().strip_prefix("Guide: ")?;
    Some(rest.trim().to_string())
}

pub struct CheckovAdapter;

impl CheckovAdapter {
    /// Failed-check count from the summary line, when present.
    fn failed_count(stdout: &str) -> Option<u32> {
        CHECKOV_SUMMARY
            .captures(stdout)
            .and_then(|caps| caps[2].parse().ok())
    }

    fn parse_failed_blocks(stdout: &str) -> Vec<Finding> {
        let lines: Vec<&str> = stdout.lines().collect();
        let mut findings = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if !line.contains("FAILED for resource") {
                continue;
            }
            let check = i
                .checked_sub(1)
                .and_then(|j| lines.get(j))
                .and_then(|l| parse_check_line(l));
            let file = lines.get(i + 1).and_then(|l| parse_file_line(l));
            let guide = lines.get(i + 2).and_then(|l| parse_guide_line(l));

            let (rule_id, title) = match check {
                Some((id, title)) => (Some(id), title),
                None => (None, line.trim().to_string()),
            };
            let (location, start, end) =
                file.unwrap_or_else(|| ("<unknown>".to_string(), None, None));
            let Ok(mut finding) = Finding::new(location, title, Severity::Unknown) else {
                continue;
            };
            if let Some(id) = rule_id {
                finding = finding.with_rule_id(id);
            }
            if let Some(line_number) = start {
                finding = finding.with_line(line_number);
            }
            if let Some(line_end) = end {
                finding = finding.with_line_end(line_end);
            }
            if let Some(url) = guide {
                finding = finding.with_detail_url(url);
            }
            findings.push(finding);
        }
        findings
    }
}

impl ToolAdapter for CheckovAdapter {
    fn adapt(&self, raw: &RawExecution) -> ScanResult {
        if raw.stdout.trim().is_empty() {
            let stderr = raw.stderr.trim();
            if !stderr.is_empty() {
                return ScanResult::tool_error(&raw.tool_id, ToolFamily::Iac, stderr);
            }
            return ScanResult::no_output(&raw.tool_id, ToolFamily::Iac, "empty stdout");
        }

        let findings = Self::parse_failed_blocks(&raw.stdout);
        if !findings.is_empty() {
            return ScanResult::with_findings(&raw.tool_id, ToolFamily::Iac, findings);
        }
        match Self::failed_count(&raw.stdout) {
            Some(0) => ScanResult::clean(&raw.tool_id, ToolFamily::Iac),
            // Failures were counted but no block could be read, or there
            // was no summary at all; either way the output is surfaced.
            _ => ScanResult::tool_error(&raw.tool_id, ToolFamily::Iac, raw.stdout.trim()),
        }
    }
}
