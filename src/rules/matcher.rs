//! The pluggable matcher framework: a matcher is a stateless strategy that
//! evaluates one rule's pattern against raw file content. Callers select
//! behavior by string key through the [`MatcherRegistry`], never by
//! concrete type.

use std::collections::HashMap;
use std::sync::Mutex;

use regex::bytes::Regex;

use super::Rule;

/// A single occurrence of a rule pattern within file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// 1-based line number.
    pub line: usize,
    /// 1-based byte column from the line start.
    pub column: usize,
    pub match_text: String,
}

/// Strategy interface for all pattern matchers.
///
/// Implementations hold no per-call mutable state, so one instance is
/// safely reusable across files and rules, including from multiple threads.
pub trait Matcher: Send + Sync {
    /// Evaluates `rule` against `content` and returns zero or more
    /// positioned matches. Content is arbitrary bytes; malformed input must
    /// produce fewer matches, never a panic.
    fn run(&self, content: &[u8], rule: &Rule) -> Vec<MatchResult>;
}

/// Byte offsets at which each line starts, for O(log n) position lookup.
pub(crate) fn line_starts(content: &[u8]) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in content.iter().enumerate() {
        if *b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// 0-based line index containing the given byte offset.
pub(crate) fn line_for_offset(starts: &[usize], offset: usize) -> usize {
    starts.partition_point(|&s| s <= offset).saturating_sub(1)
}

/// Matcher that compiles `Rule.pattern` as a regular expression over raw
/// bytes. Compiled patterns are cached across calls; an uncompilable
/// pattern is a configuration error that disables that rule only.
pub struct RegexMatcher {
    cache: Mutex<HashMap<String, Option<Regex>>>,
}

impl RegexMatcher {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the compiled regex for `pattern`, caching both successes and
    /// failures so a bad pattern is reported once, not per file.
    fn compiled(&self, pattern: &str, rule_id: &str) -> Option<Regex> {
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(entry) = cache.get(pattern) {
            return entry.clone();
        }
        let compiled = match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::warn!(rule_id, pattern, %err, "skipping rule with invalid regex");
                None
            }
        };
        cache.insert(pattern.to_string(), compiled.clone());
        compiled
    }
}

impl Default for RegexMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher for RegexMatcher {
    fn run(&self, content: &[u8], rule: &Rule) -> Vec<MatchResult> {
        let Some(re) = self.compiled(&rule.pattern, &rule.id) else {
            return Vec::new();
        };

        let starts = line_starts(content);
        re.find_iter(content)
            .map(|m| {
                let line = line_for_offset(&starts, m.start());
                MatchResult {
                    line: line + 1,
                    column: m.start() - starts[line] + 1,
                    match_text: String::from_utf8_lossy(m.as_bytes()).into_owned(),
                }
            })
            .collect()
    }
}

/// Placeholder for matcher kinds that are registered but not yet
/// implemented (structured-path matchers over JSON/YAML, hand-written
/// heuristics). Always matches nothing.
struct StubMatcher;

impl Matcher for StubMatcher {
    fn run(&self, _content: &[u8], _rule: &Rule) -> Vec<MatchResult> {
        Vec::new()
    }
}

/// Maps matcher-type strings to [`Matcher`] implementations.
///
/// Constructed explicitly and passed into the engine rather than held as
/// global state, so multiple engines with different registries can coexist
/// in one process.
pub struct MatcherRegistry {
    matchers: HashMap<String, Box<dyn Matcher>>,
}

impl MatcherRegistry {
    /// An empty registry with no matchers.
    pub fn new() -> Self {
        Self {
            matchers: HashMap::new(),
        }
    }

    /// A registry pre-populated with the built-in matchers: regex, entropy,
    /// and stubs for the structured-path and heuristic kinds.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("regex", Box::new(RegexMatcher::new()));
        registry.register("entropy", Box::new(super::entropy::EntropyMatcher));
        registry.register("jsonpath", Box::new(StubMatcher));
        registry.register("yamlpath", Box::new(StubMatcher));
        registry.register("heuristic", Box::new(StubMatcher));
        registry
    }

    pub fn register(&mut self, matcher_type: impl Into<String>, matcher: Box<dyn Matcher>) {
        self.matchers.insert(matcher_type.into(), matcher);
    }

    pub fn get(&self, matcher_type: &str) -> Option<&dyn Matcher> {
        self.matchers.get(matcher_type).map(Box::as_ref)
    }

    pub fn contains(&self, matcher_type: &str) -> bool {
        self.matchers.contains_key(matcher_type)
    }

    /// Registered matcher-type keys, sorted for stable error messages.
    pub fn matcher_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.matchers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
