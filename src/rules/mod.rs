//! Declarative rule model and the pluggable matcher framework.
//!
//! A [`Rule`] describes what to look for (`pattern` + `matcher_type`),
//! where to look (`file_patterns`), and how to classify a hit (`severity`,
//! `confidence`). Rules are built once at startup — from the builtin
//! catalog or YAML files — and are immutable for the life of the scan.

pub mod catalog;
pub mod entropy;
pub mod loader;
pub mod matcher;
pub mod policy;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::findings::{Confidence, Severity};

pub use matcher::{MatchResult, Matcher, MatcherRegistry};

/// A single declarative security rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier within a [`RuleSet`] (e.g. "SEC-030").
    pub id: String,
    #[serde(default)]
    pub version: String,
    pub description: String,
    pub severity: Severity,
    pub confidence: Confidence,
    /// Key into the [`MatcherRegistry`]; validated at construction time.
    pub matcher_type: String,
    /// Matcher-specific payload. For the regex matcher this is the pattern;
    /// the entropy matcher ignores it and reads `metadata` instead.
    #[serde(default)]
    pub pattern: String,
    /// Glob patterns restricting the files this rule applies to. Empty
    /// means the rule applies to every file.
    #[serde(default)]
    pub file_patterns: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Matcher-tunable parameters (e.g. `entropy_threshold`) plus values
    /// surfaced on findings (e.g. `cwe`).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Lowercase prefilter hints: the rule is skipped for a file unless its
    /// content contains at least one keyword.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

/// An insertion-ordered collection of rules with O(1) lookup by ID and tag.
///
/// The rule vector is the arena; `by_id` and `by_tag` hold positions into
/// it. `add` is the only mutation path that touches the indices, so they
/// stay trivially consistent — there is no rule removal.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    by_id: HashMap<String, usize>,
    by_tag: HashMap<String, Vec<usize>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule and updates the lookup indices.
    pub fn add(&mut self, rule: Rule) {
        let idx = self.rules.len();
        self.by_id.insert(rule.id.clone(), idx);
        for tag in &rule.tags {
            self.by_tag.entry(tag.clone()).or_default().push(idx);
        }
        self.rules.push(rule);
    }

    /// All rules in insertion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn by_id(&self, id: &str) -> Option<&Rule> {
        self.by_id.get(id).map(|&idx| &self.rules[idx])
    }

    /// All rules carrying the given tag, in insertion order.
    pub fn by_tag(&self, tag: &str) -> Vec<&Rule> {
        match self.by_tag.get(tag) {
            Some(idxs) => idxs.iter().map(|&idx| &self.rules[idx]).collect(),
            None => Vec::new(),
        }
    }

    /// Sets a metadata key on the rule with the given ID. Returns false if
    /// no such rule exists. Used by config-level overrides; indices are
    /// untouched because metadata is not indexed.
    pub fn set_metadata(&mut self, rule_id: &str, key: &str, value: String) -> bool {
        match self.by_id.get(rule_id) {
            Some(&idx) => {
                self.rules[idx].metadata.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::rule;
    use super::*;

    #[test]
    fn by_id_returns_the_exact_rule() {
        let mut set = RuleSet::new();
        set.add(rule("SEC-001", "regex", "a"));
        set.add(rule("SEC-002", "regex", "b"));
        let found = set.by_id("SEC-002").unwrap();
        assert_eq!(found.id, "SEC-002");
        assert_eq!(found.pattern, "b");
        assert!(set.by_id("SEC-999").is_none());
    }

    #[test]
    fn by_tag_returns_every_rule_with_that_tag() {
        let mut set = RuleSet::new();
        let mut a = rule("SEC-001", "regex", "a");
        a.tags = vec!["secrets".into(), "cloud".into()];
        let mut b = rule("SEC-002", "regex", "b");
        b.tags = vec!["secrets".into()];
        let c = rule("SEC-003", "regex", "c");
        set.add(a);
        set.add(b);
        set.add(c);

        let secrets = set.by_tag("secrets");
        assert_eq!(secrets.len(), 2);
        assert_eq!(secrets[0].id, "SEC-001");
        assert_eq!(secrets[1].id, "SEC-002");

        let cloud = set.by_tag("cloud");
        assert_eq!(cloud.len(), 1);
        assert!(set.by_tag("missing").is_empty());
    }

    #[test]
    fn rules_preserve_insertion_order() {
        let mut set = RuleSet::new();
        set.add(rule("SEC-003", "regex", "c"));
        set.add(rule("SEC-001", "regex", "a"));
        let ids: Vec<&str> = set.rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["SEC-003", "SEC-001"]);
    }

    #[test]
    fn set_metadata_updates_only_the_named_rule() {
        let mut set = RuleSet::new();
        set.add(rule("SEC-001", "entropy", ""));
        set.add(rule("SEC-002", "entropy", ""));
        assert!(set.set_metadata("SEC-001", "entropy_threshold", "3.5".into()));
        assert!(!set.set_metadata("SEC-999", "entropy_threshold", "3.5".into()));
        assert_eq!(
            set.by_id("SEC-001").unwrap().metadata.get("entropy_threshold"),
            Some(&"3.5".to_string())
        );
        assert!(set.by_id("SEC-002").unwrap().metadata.is_empty());
    }
}
