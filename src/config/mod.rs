//! Project configuration loaded from `.rulescan.toml`.
//!
//! Everything here is optional: a missing file yields the defaults, and
//! every section degrades independently. Entropy tuning is expressed as
//! metadata overrides on the builtin entropy rules, so the matcher itself
//! never knows a config file exists.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::rules::catalog::{ENTROPY_ASSIGNMENT_RULE, ENTROPY_BASE64_RULE, ENTROPY_HEX_RULE};
use crate::rules::policy::Policy;
use crate::rules::RuleSet;

pub const CONFIG_FILE_NAME: &str = ".rulescan.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub entropy: EntropyOverrides,
    /// Extra YAML rule files merged on top of the builtin catalog.
    #[serde(default)]
    pub rule_files: Vec<PathBuf>,
}

/// Threshold tuning for the three builtin entropy rules. `None` leaves the
/// catalog value in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntropyOverrides {
    pub assignment_threshold: Option<f64>,
    pub base64_threshold: Option<f64>,
    pub hex_threshold: Option<f64>,
    /// Overrides the require-context flag on the base64 and hex rules.
    pub require_context: Option<bool>,
}

impl Config {
    /// Loads config from the given file, or from `.rulescan.toml` in the
    /// current directory when `path` is `None`. A missing file is not an
    /// error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(CONFIG_FILE_NAME),
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        toml::from_str(&data)
            .map_err(|err| ScanError::Config(format!("{}: {err}", path.display())))
    }

    /// Starter config written by `rulescan init`.
    pub fn starter_toml() -> &'static str {
        r#"# rulescan configuration

[policy]
# Minimum severity that fails the scan: info, low, medium, high, critical.
fail_on = "high"
# Rule IDs to suppress entirely.
ignore_rules = []

# Per-rule severity overrides, e.g.:
# [policy.overrides]
# "SEC-061" = "low"

[entropy]
# Uncomment to tune the generic entropy rules.
# assignment_threshold = 5.0
# base64_threshold = 5.2
# hex_threshold = 4.5
# require_context = true

# Extra rule files merged on top of the builtin catalog:
# rule_files = ["rules/custom.yaml"]
"#
    }
}

impl EntropyOverrides {
    /// Pushes the configured thresholds into the builtin entropy rules'
    /// metadata. Unknown rule IDs are ignored, so a trimmed-down rule set
    /// does not make configuration fail.
    pub fn apply(&self, rules: &mut RuleSet) {
        let thresholds = [
            (ENTROPY_ASSIGNMENT_RULE, self.assignment_threshold),
            (ENTROPY_BASE64_RULE, self.base64_threshold),
            (ENTROPY_HEX_RULE, self.hex_threshold),
        ];
        for (rule_id, value) in thresholds {
            if let Some(v) = value {
                rules.set_metadata(rule_id, "entropy_threshold", v.to_string());
            }
        }
        if let Some(require) = self.require_context {
            for rule_id in [ENTROPY_BASE64_RULE, ENTROPY_HEX_RULE] {
                rules.set_metadata(rule_id, "require_context", require.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::Severity;
    use crate::rules::catalog::builtin_rules;

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/.rulescan.toml"))).unwrap();
        assert_eq!(config.policy.fail_on, Severity::High);
        assert!(config.rule_files.is_empty());
        assert!(config.entropy.assignment_threshold.is_none());
    }

    #[test]
    fn parses_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
rule_files = ["rules/extra.yaml"]

[policy]
fail_on = "medium"
ignore_rules = ["SEC-061"]

[policy.overrides]
"SEC-001" = "critical"

[entropy]
assignment_threshold = 4.0
require_context = false
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.policy.fail_on, Severity::Medium);
        assert!(config.policy.ignore_rules.contains("SEC-061"));
        assert_eq!(
            config.policy.overrides.get("SEC-001"),
            Some(&Severity::Critical)
        );
        assert_eq!(config.entropy.assignment_threshold, Some(4.0));
        assert_eq!(config.entropy.require_context, Some(false));
        assert_eq!(config.rule_files, vec![PathBuf::from("rules/extra.yaml")]);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[policy]\nfail_on = \"catastrophic\"\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "fail_om = \"high\"\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn entropy_overrides_rewrite_builtin_rule_metadata() {
        let mut rules = builtin_rules();
        let overrides = EntropyOverrides {
            assignment_threshold: Some(4.2),
            base64_threshold: None,
            hex_threshold: Some(3.9),
            require_context: Some(false),
        };
        overrides.apply(&mut rules);

        let assignment = rules.by_id(ENTROPY_ASSIGNMENT_RULE).unwrap();
        assert_eq!(
            assignment.metadata.get("entropy_threshold"),
            Some(&"4.2".to_string())
        );
        let base64 = rules.by_id(ENTROPY_BASE64_RULE).unwrap();
        assert_eq!(
            base64.metadata.get("entropy_threshold"),
            Some(&"5.2".to_string()),
            "unset override must leave the catalog value"
        );
        assert_eq!(
            base64.metadata.get("require_context"),
            Some(&"false".to_string())
        );
        let hex = rules.by_id(ENTROPY_HEX_RULE).unwrap();
        assert_eq!(
            hex.metadata.get("entropy_threshold"),
            Some(&"3.9".to_string())
        );
    }

    #[test]
    fn starter_toml_parses_back() {
        let config: Config = toml::from_str(Config::starter_toml()).unwrap();
        assert_eq!(config.policy.fail_on, Severity::High);
    }
}
