//! YAML rule file loading and construction-time validation.
//!
//! Rule files hold a single `rules` key containing an array of rule
//! definitions. Invalid matcher types and duplicate IDs are rejected here,
//! at load time, rather than discovered mid-scan.

use std::path::Path;

use serde::Deserialize;

use super::{MatcherRegistry, Rule, RuleSet};
use crate::error::{Result, ScanError};

#[derive(Debug, Deserialize)]
struct RuleFile {
    rules: Vec<Rule>,
}

/// Reads a single YAML file into a validated [`RuleSet`].
pub fn load_rules_from_file(path: &Path, registry: &MatcherRegistry) -> Result<RuleSet> {
    let data = std::fs::read_to_string(path).map_err(|err| ScanError::RuleFile {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let file: RuleFile = serde_yaml::from_str(&data).map_err(|err| ScanError::RuleFile {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let mut set = RuleSet::new();
    for rule in file.rules {
        validate_rule(&rule, &set, registry)?;
        set.add(rule);
    }
    Ok(set)
}

/// Reads every `.yaml`/`.yml` file in a directory (lexicographic order for
/// determinism) and merges them into one [`RuleSet`].
pub fn load_rules_from_dir(dir: &Path, registry: &MatcherRegistry) -> Result<RuleSet> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
        })
        .collect();
    paths.sort();

    let mut merged = RuleSet::new();
    for path in paths {
        let file_set = load_rules_from_file(&path, registry)?;
        for rule in file_set.rules() {
            validate_rule(rule, &merged, registry)?;
            merged.add(rule.clone());
        }
    }
    Ok(merged)
}

/// Checks the mandatory rule constraints: non-empty unique ID and a
/// matcher type registered in `registry`. Severity and confidence are
/// enforced by deserialization.
pub fn validate_rule(rule: &Rule, set: &RuleSet, registry: &MatcherRegistry) -> Result<()> {
    if rule.id.is_empty() {
        return Err(ScanError::Rule {
            rule_id: "<unnamed>".into(),
            message: "rule ID must not be empty".into(),
        });
    }
    if set.by_id(&rule.id).is_some() {
        return Err(ScanError::Rule {
            rule_id: rule.id.clone(),
            message: "duplicate rule ID".into(),
        });
    }
    if !registry.contains(&rule.matcher_type) {
        return Err(ScanError::Rule {
            rule_id: rule.id.clone(),
            message: format!(
                "unknown matcher_type {:?}; registered types: {}",
                rule.matcher_type,
                registry.matcher_types().join(", ")
            ),
        });
    }
    Ok(())
}
