//! Normalized result model shared by every tool adapter.
//!
//! External scanners disagree about everything: output format, exit-code
//! meaning, severity vocabulary. Everything downstream of an adapter
//! (rendering, summaries, exit codes) works exclusively on the types in
//! this module. `ScanResult` can only be built through constructors that
//! keep its status/findings/message fields consistent with each other.

use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Moderate,
    High,
    Critical,
    /// The tool reported a severity this pipeline does not recognize, or
    /// none at all.
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown => "unknown",
        }
    }

    /// Maps a tool's severity vocabulary onto ours. Unrecognized labels
    /// become `Unknown` rather than guessing.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "info" | "informational" => Severity::Info,
            "low" => Severity::Low,
            "medium" | "moderate" => Severity::Moderate,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Unknown,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Rendering family of a tool. Decides which table layout a result gets
/// without the renderer having to consult the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolFamily {
    Vulnerability,
    Secret,
    Iac,
    Diagnostic,
    Complexity,
}

impl ToolFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolFamily::Vulnerability => "vulnerability",
            ToolFamily::Secret => "secret",
            ToolFamily::Iac => "iac",
            ToolFamily::Diagnostic => "diagnostic",
            ToolFamily::Complexity => "complexity",
        }
    }
}

impl std::fmt::Display for ToolFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// The tool ran and reported nothing.
    Clean,
    /// The tool ran and reported at least one issue.
    Findings,
    /// The tool could not run, or its output could not be understood.
    ToolError,
    /// The tool ran but produced nothing to parse.
    NoOutput,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Clean => "clean",
            ScanStatus::Findings => "findings",
            ScanStatus::ToolError => "tool_error",
            ScanStatus::NoOutput => "no_output",
        }
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw capture of one tool invocation, handed from the process runner to
/// the matching adapter and then discarded.
///
/// `exit_code` is `None` when the child was killed by a signal.
#[derive(Debug, Clone)]
pub struct RawExecution {
    pub tool_id: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RawExecution {
    pub fn new(
        tool_id: impl Into<String>,
        exit_code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// One normalized issue. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// File path, package name, or resource the issue applies to.
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// End of the affected range, for tools that report one (IaC blocks).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub title: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
}

impl Finding {
    /// Builds a finding. A finding without a title is meaningless, so an
    /// empty (or whitespace-only) title is rejected.
    pub fn new(
        location: impl Into<String>,
        title: impl Into<String>,
        severity: Severity,
    ) -> Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(SweepError::InvalidFinding(
                "title must not be empty".to_string(),
            ));
        }
        Ok(Self {
            location: location.into(),
            line: None,
            line_end: None,
            rule_id: None,
            title,
            severity,
            detail_url: None,
        })
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_line_end(mut self, line_end: u32) -> Self {
        self.line_end = Some(line_end);
        self
    }

    pub fn with_rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn with_detail_url(mut self, url: impl Into<String>) -> Self {
        self.detail_url = Some(url.into());
        self
    }
}

/// Normalized outcome of one tool run.
///
/// Fields are private so the invariants hold by construction:
/// `status == Findings` exactly when `findings` is non-empty,
/// `raw_message` is set exactly when status is `ToolError` or `NoOutput`,
/// and `summary_counts` is always derived from `findings`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    tool_id: String,
    family: ToolFamily,
    status: ScanStatus,
    findings: Vec<Finding>,
    summary_counts: BTreeMap<Severity, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f32>,
}

impl ScanResult {
    pub fn clean(tool_id: impl Into<String>, family: ToolFamily) -> Self {
        Self {
            tool_id: tool_id.into(),
            family,
            status: ScanStatus::Clean,
            findings: Vec::new(),
            summary_counts: BTreeMap::new(),
            raw_message: None,
            score: None,
        }
    }

    /// An empty findings list degrades to a clean result, so a status of
    /// `Findings` with nothing behind it cannot be constructed.
    pub fn with_findings(
        tool_id: impl Into<String>,
        family: ToolFamily,
        findings: Vec<Finding>,
    ) -> Self {
        if findings.is_empty() {
            return Self::clean(tool_id, family);
        }
        let summary_counts = findings.iter().fold(BTreeMap::new(), |mut counts, f| {
            *counts.entry(f.severity).or_insert(0) += 1;
            counts
        });
        Self {
            tool_id: tool_id.into(),
            family,
            status: ScanStatus::Findings,
            findings,
            summary_counts,
            raw_message: None,
            score: None,
        }
    }

    /// The process failed to execute, or its output could not be parsed.
    /// The message preserves whatever the tool produced.
    pub fn tool_error(
        tool_id: impl Into<String>,
        family: ToolFamily,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            family,
            status: ScanStatus::ToolError,
            findings: Vec::new(),
            summary_counts: BTreeMap::new(),
            raw_message: Some(message.into()),
            score: None,
        }
    }

    /// The tool ran but produced nothing to parse.
    pub fn no_output(
        tool_id: impl Into<String>,
        family: ToolFamily,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            family,
            status: ScanStatus::NoOutput,
            findings: Vec::new(),
            summary_counts: BTreeMap::new(),
            raw_message: Some(message.into()),
            score: None,
        }
    }

    /// Attaches a 0-10 quality score (linter-style tools only). Values
    /// outside the scale are clamped; pylint can rate code below zero.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score.clamp(0.0, 10.0));
        self
    }

    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    pub fn family(&self) -> ToolFamily {
        self.family
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn summary_counts(&self) -> &BTreeMap<Severity, usize> {
        &self.summary_counts
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.summary_counts.get(&severity).copied().unwrap_or(0)
    }

    pub fn raw_message(&self) -> Option<&str> {
        self.raw_message.as_deref()
    }

    pub fn score(&self) -> Option<f32> {
        self.score
    }
}
