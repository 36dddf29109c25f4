use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::findings::Finding;
use crate::rules::policy::PolicyVerdict;

#[derive(Serialize)]
struct JsonReport<'a> {
    target: &'a str,
    generated_at: DateTime<Utc>,
    findings: &'a [Finding],
    verdict: &'a PolicyVerdict,
}

/// Render findings as a JSON report.
pub fn render(findings: &[Finding], verdict: &PolicyVerdict, target_name: &str) -> Result<String> {
    let report = JsonReport {
        target: target_name,
        generated_at: Utc::now(),
        findings,
        verdict,
    };
    let json = serde_json::to_string_pretty(&report)?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::test_support::finding;
    use crate::findings::Severity;
    use crate::rules::policy::Policy;

    #[test]
    fn report_round_trips_through_serde_json() {
        let findings = vec![finding("SEC-001", "a.py", 1, Severity::High)];
        let verdict = Policy::default().evaluate(&findings);
        let out = render(&findings, &verdict, "myrepo").unwrap();

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["target"], "myrepo");
        assert_eq!(value["findings"][0]["rule_id"], "SEC-001");
        assert_eq!(value["findings"][0]["line"], 1);
        assert_eq!(value["verdict"]["pass"], false);
        assert!(value["generated_at"].is_string());
    }
}
