use std::collections::BTreeMap;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::Result;
use crate::findings::{Finding, Severity};

/// Render findings as SARIF 2.1.0.
///
/// Produces a self-contained SARIF log compatible with GitHub Code Scanning
/// and other SARIF consumers.
pub fn render(findings: &[Finding], target_name: &str) -> Result<String> {
    // One driver rule per distinct rule ID, keyed for stable ordering.
    let mut by_rule: BTreeMap<&str, &Finding> = BTreeMap::new();
    for f in findings {
        by_rule.entry(&f.rule_id).or_insert(f);
    }

    let rules: Vec<Value> = by_rule
        .values()
        .map(|finding| {
            let mut rule = json!({
                "id": finding.rule_id,
                "shortDescription": { "text": finding.message },
                "defaultConfiguration": {
                    "level": severity_to_sarif_level(finding.severity),
                },
            });
            if let Some(cwe) = finding.metadata.get("cwe") {
                rule["properties"] = json!({
                    "tags": [cwe],
                });
            }
            rule
        })
        .collect();

    let results: Vec<Value> = findings
        .iter()
        .map(|f| {
            let mut result = json!({
                "ruleId": f.rule_id,
                "level": severity_to_sarif_level(f.severity),
                "message": { "text": f.message },
                "partialFingerprints": {
                    "primaryLocationLineHash": f.fingerprint,
                },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": {
                            "uri": f.path,
                        },
                        "region": {
                            "startLine": f.line,
                            "startColumn": f.column,
                            "snippet": { "text": f.match_text },
                        },
                    },
                }],
            });

            if let Some(remediation) = f.metadata.get("remediation") {
                result["fixes"] = json!([{
                    "description": { "text": remediation },
                }]);
            }

            result
        })
        .collect();

    let sarif = json!({
        "$schema": "https://docs.oasis-open.org/sarif/sarif/v2.1.0/errata01/os/schemas/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "rulescan",
                    "informationUri": "https://github.com/rulescan/rulescan",
                    "version": env!("CARGO_PKG_VERSION"),
                    "semanticVersion": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                },
            },
            "results": results,
            "automationDetails": {
                "id": format!("rulescan/{}", target_name),
                "guid": Uuid::new_v4().to_string(),
            },
        }],
    });

    let output = serde_json::to_string_pretty(&sarif)?;
    Ok(output)
}

fn severity_to_sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Info => "note",
    }
}
