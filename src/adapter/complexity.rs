//! Adapter for radon's cyclomatic-complexity output.
//!
//! `radon cc <path> -s` prints grouped text: a file header at column
//! zero, then one indented record per function/method/class, like
//! `    F 12:0 process_all - C (18)`. Grades A and B are below the
//! reporting threshold and are dropped; a run where nothing survives the
//! filter is a clean result.

use crate::adapter::ToolAdapter;
use crate::model::{Finding, RawExecution, ScanResult, Severity, ToolFamily};

struct Block<'a> {
    name: &'a str,
    line: Option<u32>,
    grade: &'a str,
    score: Option<u32>,
}

/// Parses one block record. The shape is strict on purpose: anything
/// that does not look exactly like `F 1:0 name - C (19)` is not a
/// record and falls through to header handling.
fn parse_block(line: &str) -> Option<Block<'_>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 6 {
        return None;
    }
    if !matches!(tokens[0], "F" | "M" | "C") {
        return None;
    }
    if !tokens[1].contains(':') || tokens[3] != "-" {
        return None;
    }
    let grade = tokens[4];
    if grade.len() != 1 || !grade.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    Some(Block {
        name: tokens[2],
        line: tokens[1].split(':').next().and_then(|n| n.parse().ok()),
        grade,
        score: tokens[5]
            .trim_matches(|c| c == '(' || c == ')')
            .parse()
            .ok(),
    })
}

fn grade_meaning(grade: &str) -> Option<(Severity, &'static str)> {
    match grade {
        "C" => Some((Severity::Moderate, "moderate")),
        "D" => Some((Severity::High, "high")),
        "E" => Some((Severity::Critical, "very high")),
        "F" => Some((Severity::Critical, "unmaintainable")),
        _ => None,
    }
}

fn failure_message(raw: &RawExecution) -> String {
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

pub struct RadonAdapter;

impl RadonAdapter {
    fn parse(stdout: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut current_file = "<unknown>".to_string();
        for line in stdout.lines() {
            if let Some(block) = parse_block(line) {
                let Some((severity, label)) = grade_meaning(block.grade) else {
                    continue;
                };
                let title = match block.score {
                    Some(score) => format!(
                        "{} has {} complexity ({}, score {})",
                        block.name, label, block.grade, score
                    ),
                    None => format!("{} has {} complexity ({})", block.name, label, block.grade),
                };
                let Ok(finding) = Finding::new(current_file.clone(), title, severity) else {
                    continue;
                };
                findings.push(match block.line {
                    Some(line_number) => finding.with_line(line_number),
                    None => finding,
                });
            } else if !line.starts_with(char::is_whitespace) && !line.trim().is_empty() {
                current_file = line.trim().to_string();
            }
        }
        findings
    }
}

impl ToolAdapter for RadonAdapter {
    fn adapt(&self, raw: &RawExecution) -> ScanResult {
        if raw.exit_code != Some(0) {
            return ScanResult::tool_error(
                &raw.tool_id,
                ToolFamily::Complexity,
                failure_message(raw),
            );
        }
        // Empty findings collapse to clean; the renderer supplies the
        // below-threshold message for clean complexity results.
        ScanResult::with_findings(&raw.tool_id, ToolFamily::Complexity, Self::parse(&raw.stdout))
    }
}
