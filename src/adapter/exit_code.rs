//! Adapters for tools whose exit code carries the verdict.
//!
//! For this family the code, not stdout content, decides the status
//! class: exit 0 is clean even when stdout chatters, and a "findings"
//! code makes the adapter mine stdout for diagnostic lines. The
//! code-to-meaning tables below follow each tool's documented exit
//! codes; they are static configuration, never inferred from output.

use crate::adapter::ToolAdapter;
use crate::model::{Finding, RawExecution, ScanResult, Severity, ToolFamily};
use regex::Regex;
use std::sync::LazyLock;

// pylint sets one bit per message category it emitted (fatal, error,
// warning, refactor, convention) and reserves 32 for usage errors.
const PYLINT_MESSAGE_BITS: i32 = 0b1_1111;
const PYLINT_USAGE_ERROR: i32 = 32;

static PYLINT_DIAGNOSTIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?):(\d+):(\d+): ([CRWEFI]\d{4}): (.+)$").unwrap());
static PYLINT_SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rated at (-?\d+(?:\.\d+)?)/10").unwrap());
static MYPY_DIAGNOSTIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?):(\d+)(?::\d+)?: (error|warning|note): (.+)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeMeaning {
    Clean,
    Findings,
    Fatal,
    Unrecognized,
}

/// Message for a fatal exit: the tool's own complaint, wherever it put it.
fn fatal_message(raw: &RawExecution) -> String {
    let stderr = raw.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = raw.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    "no output".to_string()
}

fn unrecognized_message(raw: &RawExecution) -> String {
    match raw.exit_code {
        Some(code) => format!("exited with unrecognized code {code}"),
        None => "terminated by a signal before reporting".to_string(),
    }
}

/// The exit code promised findings but stdout yielded none; that is a
/// parse failure, so the raw output is surfaced rather than dropped.
fn undecodable_findings(raw: &RawExecution) -> ScanResult {
    let stdout = raw.stdout.trim();
    let message = if stdout.is_empty() {
        "reported findings but produced no diagnostics".to_string()
    } else {
        stdout.to_string()
    };
    ScanResult::tool_error(&raw.tool_id, ToolFamily::Diagnostic, message)
}

// ---------------------------------------------------------------------------
// pylint

/// Pylint (`pylint <path>`). Diagnostic lines look like
/// `app.py:10:0: C0301: Line too long (120/100)`; the trailing report
/// carries a 0-10 quality score.
pub struct PylintAdapter;

impl PylintAdapter {
    fn classify(code: Option<i32>) -> CodeMeaning {
        match code {
            Some(0) => CodeMeaning::Clean,
            Some(c) if c & PYLINT_USAGE_ERROR != 0 => CodeMeaning::Fatal,
            Some(c) if c > 0 && c & !PYLINT_MESSAGE_BITS == 0 => CodeMeaning::Findings,
            _ => CodeMeaning::Unrecognized,
        }
    }

    fn severity_for(code: &str) -> Severity {
        match code.as_bytes().first() {
            Some(b'F') => Severity::Critical,
            Some(b'E') => Severity::High,
            Some(b'W') => Severity::Moderate,
            Some(b'R') | Some(b'C') => Severity::Low,
            Some(b'I') => Severity::Info,
            _ => Severity::Unknown,
        }
    }

    fn parse_diagnostics(stdout: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for line in stdout.lines() {
            let Some(caps) = PYLINT_DIAGNOSTIC.captures(line) else {
                continue;
            };
            let code = &caps[4];
            let Ok(finding) = Finding::new(&caps[1], &caps[5], Self::severity_for(code)) else {
                continue;
            };
            let finding = match caps[2].parse::<u32>() {
                Ok(line_number) => finding.with_line(line_number),
                Err(_) => finding,
            };
            findings.push(finding.with_rule_id(code));
        }
        findings
    }

    fn extract_score(stdout: &str) -> Option<f32> {
        PYLINT_SCORE
            .captures(stdout)
            .and_then(|caps| caps[1].parse::<f32>().ok())
    }
}

impl ToolAdapter for PylintAdapter {
    fn adapt(&self, raw: &RawExecution) -> ScanResult {
        match Self::classify(raw.exit_code) {
            CodeMeaning::Clean => {
                let result = ScanResult::clean(&raw.tool_id, ToolFamily::Diagnostic);
                match Self::extract_score(&raw.stdout) {
                    Some(score) => result.with_score(score),
                    None => result,
                }
            }
            CodeMeaning::Findings => {
                let findings = Self::parse_diagnostics(&raw.stdout);
                if findings.is_empty() {
                    return undecodable_findings(raw);
                }
                let result =
                    ScanResult::with_findings(&raw.tool_id, ToolFamily::Diagnostic, findings);
                match Self::extract_score(&raw.stdout) {
                    Some(score) => result.with_score(score),
                    None => result,
                }
            }
            CodeMeaning::Fatal => {
                ScanResult::tool_error(&raw.tool_id, ToolFamily::Diagnostic, fatal_message(raw))
            }
            CodeMeaning::Unrecognized => ScanResult::tool_error(
                &raw.tool_id,
                ToolFamily::Diagnostic,
                unrecognized_message(raw),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// mypy

/// Mypy (`mypy <path>`). Exit 0 clean, 1 type issues, 2 fatal
/// (bad flags, unreadable target).
pub struct MypyAdapter;

impl MypyAdapter {
    fn classify(code: Option<i32>) -> CodeMeaning {
        match code {
            Some(0) => CodeMeaning::Clean,
            Some(1) => CodeMeaning::Findings,
            Some(2) => CodeMeaning::Fatal,
            _ => CodeMeaning::Unrecognized,
        }
    }

    fn parse_diagnostics(stdout: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for line in stdout.lines() {
            let Some(caps) = MYPY_DIAGNOSTIC.captures(line) else {
                continue;
            };
            let severity = match &caps[3] {
                "error" => Severity::High,
                "warning" => Severity::Moderate,
                _ => Severity::Info,
            };
            let Ok(finding) = Finding::new(&caps[1], &caps[4], severity) else {
                continue;
            };
            let finding = match caps[2].parse::<u32>() {
                Ok(line_number) => finding.with_line(line_number),
                Err(_) => finding,
            };
            findings.push(finding);
        }
        findings
    }
}

impl ToolAdapter for MypyAdapter {
    fn adapt(&self, raw: &RawExecution) -> ScanResult {
        match Self::classify(raw.exit_code) {
            CodeMeaning::Clean => ScanResult::clean(&raw.tool_id, ToolFamily::Diagnostic),
            CodeMeaning::Findings => {
                let findings = Self::parse_diagnostics(&raw.stdout);
                if findings.is_empty() {
                    return undecodable_findings(raw);
                }
                ScanResult::with_findings(&raw.tool_id, ToolFamily::Diagnostic, findings)
            }
            CodeMeaning::Fatal => {
                ScanResult::tool_error(&raw.tool_id, ToolFamily::Diagnostic, fatal_message(raw))
            }
            CodeMeaning::Unrecognized => ScanResult::tool_error(
                &raw.tool_id,
                ToolFamily::Diagnostic,
                unrecognized_message(raw),
            ),
        }
    }
}
