#[cfg(test)]
pub mod fixtures {
    use crate::model::{Finding, ScanResult, Severity, ToolFamily};

    pub fn create_finding(location: &str, line: u32, severity: Severity, title: &str) -> Finding {
        Finding::new(location, title, severity)
            .unwrap()
            .with_line(line)
    }

    pub fn findings_result(tool_id: &str, severities: &[Severity]) -> ScanResult {
        let findings = severities
            .iter()
            .enumerate()
            .map(|(i, s)| Finding::new("app.py", format!("issue {i}"), *s).unwrap())
            .collect();
        ScanResult::with_findings(tool_id, ToolFamily::Vulnerability, findings)
    }

    pub fn hardcoded_password_finding() -> Finding {
        create_finding(
            "app/settings.py",
            14,
            Severity::High,
            "Possible hardcoded password: 'hunter2'",
        )
        .with_rule_id("B105")
        .with_detail_url(
            "https://bandit.readthedocs.io/en/latest/plugins/b105_hardcoded_password_string.html",
        )
    }
}
