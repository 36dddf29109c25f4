use crate::findings::{Finding, Severity};
use crate::rules::policy::PolicyVerdict;

/// Render findings as plain console output, grouped by severity then file path.
pub fn render(findings: &[Finding], verdict: &PolicyVerdict) -> String {
    let mut output = String::new();

    if findings.is_empty() {
        output.push_str("\n  No security findings detected.\n\n");
        return output;
    }

    // Sort by severity (critical first), then by file path
    let mut sorted: Vec<&Finding> = findings.iter().collect();
    sorted.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.line.cmp(&b.line))
    });

    output.push_str(&format!("\n  {} finding(s) detected:\n\n", findings.len()));

    for finding in &sorted {
        let severity_tag = match finding.severity {
            Severity::Critical => "[CRITICAL]",
            Severity::High => "[HIGH]    ",
            Severity::Medium => "[MEDIUM]  ",
            Severity::Low => "[LOW]     ",
            Severity::Info => "[INFO]    ",
        };

        output.push_str(&format!(
            "  {} {} {}\n",
            severity_tag, finding.rule_id, finding.message
        ));
        output.push_str(&format!(
            "           at {}:{}:{}\n",
            finding.path, finding.line, finding.column
        ));
        if let Some(remediation) = finding.metadata.get("remediation") {
            output.push_str(&format!("           fix: {}\n", remediation));
        }
        output.push('\n');
    }

    // Verdict
    let status = if verdict.pass { "PASS" } else { "FAIL" };
    output.push_str(&format!(
        "  Result: {} (threshold: {}, highest: {})\n\n",
        status,
        verdict.fail_threshold,
        verdict
            .highest_severity
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".into()),
    ));

    output
}
