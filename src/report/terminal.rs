//! Fixed-width tabular rendering for terminals.
//!
//! Each tool family gets its own column layout. Cell text is truncated
//! and padded before any color is applied, so ANSI escapes never count
//! against column widths. Truncation is cosmetic only; counts and
//! summaries are computed from the model, never from rendered text.

use crate::model::{Finding, ScanResult, ScanStatus, Severity, ToolFamily};
use crate::report::{BatchReport, Reporter};
use colored::Colorize;
use std::collections::HashMap;

const LOCATION_WIDTH: usize = 28;
const SECRET_LOCATION_WIDTH: usize = 32;
const LINE_WIDTH: usize = 5;
const RANGE_WIDTH: usize = 9;
const SEVERITY_WIDTH: usize = 8;
const RULE_WIDTH: usize = 12;
const CHECK_WIDTH: usize = 14;
const CODE_WIDTH: usize = 7;
const DESCRIPTION_WIDTH: usize = 70;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{cut}...")
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", truncate(text, width))
}

fn paint(severity: Severity, text: String) -> String {
    match severity {
        Severity::Critical => text.red().bold(),
        Severity::High => text.yellow().bold(),
        Severity::Moderate => text.cyan(),
        Severity::Low => text.white(),
        Severity::Info => text.dimmed(),
        Severity::Unknown => text.magenta(),
    }
    .to_string()
}

fn severity_cell(severity: Severity) -> String {
    paint(severity, pad(&severity.to_string(), SEVERITY_WIDTH))
}

fn line_cell(line: Option<u32>) -> String {
    match line {
        Some(n) => n.to_string(),
        None => "-".to_string(),
    }
}

fn range_cell(finding: &Finding) -> String {
    match (finding.line, finding.line_end) {
        (Some(start), Some(end)) => format!("{start}-{end}"),
        (Some(start), None) => start.to_string(),
        _ => "-".to_string(),
    }
}

fn header_row(columns: &[(&str, usize)]) -> String {
    let mut row = String::new();
    for (name, width) in columns {
        row.push_str(&pad(name, *width));
        row.push_str("  ");
    }
    format!("{}\n", row.trim_end().dimmed())
}

pub struct TerminalReporter {
    show_urls: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_urls: true }
    }

    /// Suppresses the "More info:" link list, for terse CI logs.
    pub fn with_urls(mut self, show: bool) -> Self {
        self.show_urls = show;
        self
    }

    fn vulnerability_table(&self, findings: &[Finding]) -> String {
        let mut out = header_row(&[
            ("LOCATION", LOCATION_WIDTH),
            ("LINE", LINE_WIDTH),
            ("SEVERITY", SEVERITY_WIDTH),
            ("RULE", RULE_WIDTH),
            ("DESCRIPTION", DESCRIPTION_WIDTH),
        ]);
        for finding in findings {
            out.push_str(&pad(&finding.location, LOCATION_WIDTH));
            out.push_str("  ");
            out.push_str(&pad(&line_cell(finding.line), LINE_WIDTH));
            out.push_str("  ");
            out.push_str(&severity_cell(finding.severity));
            out.push_str("  ");
            out.push_str(&pad(finding.rule_id.as_deref().unwrap_or("-"), RULE_WIDTH));
            out.push_str("  ");
            out.push_str(&truncate(&finding.title, DESCRIPTION_WIDTH));
            out.push('\n');
        }
        out
    }

    fn secret_table(&self, findings: &[Finding]) -> String {
        let mut out = header_row(&[
            ("LOCATION", SECRET_LOCATION_WIDTH),
            ("LINE", LINE_WIDTH),
            ("SEVERITY", SEVERITY_WIDTH),
            ("DESCRIPTION", DESCRIPTION_WIDTH),
        ]);
        for finding in findings {
            out.push_str(&pad(&finding.location, SECRET_LOCATION_WIDTH));
            out.push_str("  ");
            out.push_str(&pad(&line_cell(finding.line), LINE_WIDTH));
            out.push_str("  ");
            out.push_str(&severity_cell(finding.severity));
            out.push_str("  ");
            out.push_str(&truncate(&finding.title, DESCRIPTION_WIDTH));
            out.push('\n');
        }
        out
    }

    fn iac_table(&self, findings: &[Finding]) -> String {
        let mut out = header_row(&[
            ("FILE", LOCATION_WIDTH),
            ("LINES", RANGE_WIDTH),
            ("CHECK", CHECK_WIDTH),
            ("DESCRIPTION", DESCRIPTION_WIDTH),
        ]);
        for finding in findings {
            out.push_str(&pad(&finding.location, LOCATION_WIDTH));
            out.push_str("  ");
            out.push_str(&pad(&range_cell(finding), RANGE_WIDTH));
            out.push_str("  ");
            out.push_str(&pad(finding.rule_id.as_deref().unwrap_or("-"), CHECK_WIDTH));
            out.push_str("  ");
            out.push_str(&truncate(&finding.title, DESCRIPTION_WIDTH));
            out.push('\n');
        }
        out
    }

    /// Diagnostics are grouped by source file, first-seen order.
    fn diagnostic_tables(&self, findings: &[Finding]) -> String {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&Finding>> = HashMap::new();
        for finding in findings {
            let file = finding.location.as_str();
            if !groups.contains_key(file) {
                order.push(file);
            }
            groups.entry(file).or_default().push(finding);
        }

        let mut out = String::new();
        for (i, file) in order.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("{}\n", file.bold()));
            out.push_str("  ");
            out.push_str(&header_row(&[
                ("LINE", LINE_WIDTH),
                ("CODE", CODE_WIDTH),
                ("SEVERITY", SEVERITY_WIDTH),
                ("MESSAGE", DESCRIPTION_WIDTH),
            ]));
            for finding in &groups[*file] {
                out.push_str("  ");
                out.push_str(&pad(&line_cell(finding.line), LINE_WIDTH));
                out.push_str("  ");
                out.push_str(&pad(finding.rule_id.as_deref().unwrap_or("-"), CODE_WIDTH));
                out.push_str("  ");
                out.push_str(&severity_cell(finding.severity));
                out.push_str("  ");
                out.push_str(&truncate(&finding.title, DESCRIPTION_WIDTH));
                out.push('\n');
            }
        }
        out
    }

    fn complexity_table(&self, findings: &[Finding]) -> String {
        let mut out = header_row(&[
            ("FILE", LOCATION_WIDTH),
            ("LINE", LINE_WIDTH),
            ("SEVERITY", SEVERITY_WIDTH),
            ("DESCRIPTION", DESCRIPTION_WIDTH),
        ]);
        for finding in findings {
            out.push_str(&pad(&finding.location, LOCATION_WIDTH));
            out.push_str("  ");
            out.push_str(&pad(&line_cell(finding.line), LINE_WIDTH));
            out.push_str("  ");
            out.push_str(&severity_cell(finding.severity));
            out.push_str("  ");
            out.push_str(&truncate(&finding.title, DESCRIPTION_WIDTH));
            out.push('\n');
        }
        out
    }

    fn url_list(&self, findings: &[Finding]) -> String {
        let mut seen: Vec<&str> = Vec::new();
        for url in findings.iter().filter_map(|f| f.detail_url.as_deref()) {
            if !seen.contains(&url) {
                seen.push(url);
            }
        }
        if seen.is_empty() {
            return String::new();
        }
        let mut out = String::from("More info:\n");
        for url in seen {
            out.push_str(&format!("  {}\n", url.bright_blue()));
        }
        out
    }

    fn findings_table(&self, result: &ScanResult) -> String {
        let mut out = match result.family() {
            ToolFamily::Vulnerability => self.vulnerability_table(result.findings()),
            ToolFamily::Secret => self.secret_table(result.findings()),
            ToolFamily::Iac => self.iac_table(result.findings()),
            ToolFamily::Diagnostic => self.diagnostic_tables(result.findings()),
            ToolFamily::Complexity => self.complexity_table(result.findings()),
        };
        if self.show_urls {
            out.push_str(&self.url_list(result.findings()));
        }
        out
    }

    fn findings_footer(&self, result: &ScanResult) -> String {
        let counts: Vec<String> = result
            .summary_counts()
            .iter()
            .rev()
            .map(|(severity, count)| format!("{count} {}", paint(*severity, severity.as_str().to_string())))
            .collect();
        format!(
            "{} finding(s): {}\n",
            result.findings().len(),
            counts.join(", ")
        )
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, result: &ScanResult) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {}\n",
            format!("[{}]", result.tool_id()).bold(),
            result.family().to_string().dimmed()
        ));

        match result.status() {
            ScanStatus::Clean => {
                if result.family() == ToolFamily::Complexity {
                    output.push_str(&format!(
                        "{}\n",
                        "all analyzed units are below the complexity threshold".green()
                    ));
                } else {
                    output.push_str(&format!("{}\n", "No issues found.".green()));
                }
            }
            ScanStatus::Findings => {
                output.push_str(&self.findings_table(result));
                output.push_str(&self.findings_footer(result));
            }
            ScanStatus::ToolError => {
                output.push_str(&format!(
                    "{} {}\n",
                    "Error:".red().bold(),
                    result.raw_message().unwrap_or("tool failed")
                ));
            }
            ScanStatus::NoOutput => {
                output.push_str(&format!(
                    "{}\n",
                    format!("No output: {}", result.raw_message().unwrap_or("")).magenta()
                ));
            }
        }

        if let Some(score) = result.score() {
            output.push_str(&format!("Rated {score:.1}/10\n"));
        }
        output
    }

    fn report_batch(&self, batch: &BatchReport) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n",
            format!("secsweep v{} - Security and Lint Sweep", batch.version).bold()
        ));
        output.push_str(&format!("Target: {}\n", batch.target));
        output.push_str(&format!("Started: {}\n\n", batch.started_at));

        if batch.results.is_empty() {
            output.push_str("No tools were run.\n");
            return output;
        }

        for result in &batch.results {
            output.push_str(&self.report(result));
            output.push('\n');
        }

        output.push_str(&format!("{}\n", "━".repeat(50)));
        let summary = &batch.summary;
        if summary.failed_tools.is_empty() {
            output.push_str(&format!("Tools run: {}\n", summary.tools_run));
        } else {
            output.push_str(&format!(
                "Tools run: {} ({} failed: {})\n",
                summary.tools_run,
                summary.failed_tools.len().to_string().red().bold(),
                summary.failed_tools.join(", ")
            ));
        }
        output.push_str(&format!(
            "Findings: {} ({} critical, {} high, {} moderate, {} low, {} info, {} unknown)\n",
            summary.findings_total,
            summary.critical.to_string().red().bold(),
            summary.high.to_string().yellow().bold(),
            summary.moderate.to_string().cyan(),
            summary.low,
            summary.info,
            summary.unknown.to_string().magenta(),
        ));
        let result_text = if summary.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        output.push_str(&format!(
            "Result: {} (exit code {})\n",
            result_text,
            summary.exit_code()
        ));
        output
    }
}
