//! Canonical security finding model shared by every analyzer and reporter.
//!
//! Matchers produce raw positions; the engine turns them into [`Finding`]
//! values which are collected into a [`FindingSet`] for deduplication,
//! deterministic ordering, and downstream rendering (console, JSON, SARIF).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How dangerous a confirmed match is. Ordered from least to most severe so
/// that `Ord` comparisons against a fail threshold read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// How certain the scanner is that the match is a true positive. Orthogonal
/// to [`Severity`]; both are declared on the rule and carried through
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// A single reported occurrence of a rule match, positioned in a file.
///
/// Derived deterministically from a rule plus a match result plus the file
/// path; carries no mutable state after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the rule that produced this finding (e.g. "SEC-001").
    pub rule_id: String,
    pub severity: Severity,
    pub confidence: Confidence,
    /// Repo-relative path of the scanned file.
    pub path: String,
    /// 1-based line of the match.
    pub line: usize,
    /// 1-based byte column of the match within its line.
    pub column: usize,
    /// The matched text itself.
    pub match_text: String,
    /// Human-readable description, copied from the rule.
    pub message: String,
    /// Rule metadata surfaced to reporters (e.g. a CWE identifier).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    /// Stable identity hash; see [`compute_fingerprint`].
    #[serde(default)]
    pub fingerprint: String,
}

/// Produces a deterministic SHA-256 hex digest over the fields that define
/// a finding's identity: rule ID, path, line, column, and matched text.
/// Components are NUL-separated to avoid ambiguous concatenations.
pub fn compute_fingerprint(
    rule_id: &str,
    path: &str,
    line: usize,
    column: usize,
    match_text: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rule_id.as_bytes());
    hasher.update([0]);
    hasher.update(path.as_bytes());
    hasher.update([0]);
    hasher.update(line.to_string().as_bytes());
    hasher.update([0]);
    hasher.update(column.to_string().as_bytes());
    hasher.update([0]);
    hasher.update(match_text.as_bytes());
    hex::encode(hasher.finalize())
}

/// An append-only collection of findings for one scan session, with
/// first-seen-order deduplication. Not shared across concurrent scans.
#[derive(Debug, Default)]
pub struct FindingSet {
    items: Vec<Finding>,
}

impl FindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finding. An empty fingerprint is filled in from the
    /// identity fields so every stored finding is always deduplicable.
    pub fn add(&mut self, mut finding: Finding) {
        if finding.fingerprint.is_empty() {
            finding.fingerprint = compute_fingerprint(
                &finding.rule_id,
                &finding.path,
                finding.line,
                finding.column,
                &finding.match_text,
            );
        }
        self.items.push(finding);
    }

    /// Collapses findings that share a fingerprint, keeping the first
    /// occurrence. Idempotent; call once after all findings are added.
    pub fn deduplicate(&mut self) {
        let mut seen: HashSet<String> = HashSet::with_capacity(self.items.len());
        self.items.retain(|f| seen.insert(f.fingerprint.clone()));
    }

    /// Orders findings by rule ID, then path, then line, so output is
    /// reproducible regardless of artifact traversal order.
    pub fn sort_deterministic(&mut self) {
        self.items.sort_by(|a, b| {
            a.rule_id
                .cmp(&b.rule_id)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.line.cmp(&b.line))
        });
    }

    /// Removes all findings whose rule ID matches any of the given IDs.
    pub fn remove_by_rule_ids(&mut self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        let disabled: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.items.retain(|f| !disabled.contains(f.rule_id.as_str()));
    }

    /// Current findings in insertion order (post-dedup if `deduplicate` ran).
    pub fn findings(&self) -> &[Finding] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Minimal finding constructor for policy and output tests.
    pub fn finding(rule_id: &str, path: &str, line: usize, severity: Severity) -> Finding {
        Finding {
            rule_id: rule_id.into(),
            severity,
            confidence: Confidence::Medium,
            path: path.into(),
            line,
            column: 1,
            match_text: "REDACTED-MATCH".into(),
            message: format!("test finding for {rule_id}"),
            metadata: HashMap::new(),
            fingerprint: compute_fingerprint(rule_id, path, line, 1, "REDACTED-MATCH"),
        }
    }
}
