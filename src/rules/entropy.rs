//! Entropy-based secret detection.
//!
//! Extracts candidate strings from each line using several tokenizers
//! (quoted literals, assignment right-hand sides, base64 blobs, hex runs),
//! scores them with Shannon entropy, and reports candidates that clear a
//! context-sensitive threshold. Layered filters — length floor, shape
//! rejection, entropy, context — trade recall for precision.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::matcher::{MatchResult, Matcher};
use super::Rule;

/// Minimum Shannon entropy (bits/symbol) for a candidate to be flagged
/// when the rule carries no `entropy_threshold` metadata.
pub const DEFAULT_ENTROPY_THRESHOLD: f64 = 4.5;

/// Subtracted from the threshold when the candidate's line contains a
/// secret-suggestive keyword.
pub const CONTEXT_BOOST_REDUCTION: f64 = 0.5;

/// Candidates shorter than this are discarded unconditionally. A short
/// string cannot carry enough information to be a meaningful secret even
/// at maximal entropy.
pub const MIN_CANDIDATE_LEN: usize = 16;

/// Lowercase substrings that, when present anywhere in a line, lower the
/// effective entropy threshold for candidates on that line.
const SECRET_HINTS: &[&str] = &[
    "password",
    "secret",
    "key",
    "token",
    "credential",
    "api_key",
    "private",
];

/// Base64-alphabet runs of at least 20 characters.
static BASE64_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9+/=]{20,}").expect("base64 candidate regex"));

/// Hexadecimal runs of at least 16 characters.
static HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9a-fA-F]{16,}").expect("hex candidate regex"));

/// Computes the empirical Shannon entropy (base 2) of the character
/// frequency distribution of `s`. Pure and total: the empty string scores
/// 0.0, and the result depends only on symbol frequencies, not position.
pub fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let mut counts: std::collections::HashMap<char, usize> = std::collections::HashMap::new();
    let mut len = 0usize;
    for c in s.chars() {
        *counts.entry(c).or_insert(0) += 1;
        len += 1;
    }
    let len = len as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Matcher that flags high-entropy candidate strings as possible secrets.
///
/// Tunable via rule metadata: `entropy_threshold` (decimal string;
/// unparsable values silently fall back to the default) and
/// `require_context` (boolean string; when true, lines without a
/// secret-hint keyword produce no candidates at all).
pub struct EntropyMatcher;

impl Matcher for EntropyMatcher {
    fn run(&self, content: &[u8], rule: &Rule) -> Vec<MatchResult> {
        let threshold = rule
            .metadata
            .get("entropy_threshold")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(DEFAULT_ENTROPY_THRESHOLD);
        let require_context = rule
            .metadata
            .get("require_context")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        let mut results = Vec::new();

        for (line_idx, raw_line) in content.split(|&b| b == b'\n').enumerate() {
            let line = String::from_utf8_lossy(raw_line);
            let line_lower = line.to_lowercase();

            let boosted = has_secret_context(&line_lower);
            if require_context && !boosted {
                continue;
            }
            let effective = if boosted {
                threshold - CONTEXT_BOOST_REDUCTION
            } else {
                threshold
            };

            // Candidates from all tokenizers, deduplicated by position and
            // text so overlapping extractions are not double-reported.
            let mut seen: HashSet<(usize, String)> = HashSet::new();
            let mut candidates: Vec<(usize, String)> = Vec::new();
            {
                let mut add = |col: usize, text: &str| {
                    let key = (col, text.to_string());
                    if seen.insert(key.clone()) {
                        candidates.push(key);
                    }
                };
                extract_quoted(&line, &mut add);
                extract_assignment_rhs(&line, &mut add);
                extract_regex_candidates(&line, &BASE64_RE, &mut add);
                extract_regex_candidates(&line, &HEX_RE, &mut add);
            }

            for (column, text) in candidates {
                if text.len() < MIN_CANDIDATE_LEN {
                    continue;
                }
                if is_likely_not_secret(&text) {
                    continue;
                }
                if shannon_entropy(&text) >= effective {
                    results.push(MatchResult {
                        line: line_idx + 1,
                        column,
                        match_text: text,
                    });
                }
            }
        }

        results
    }
}

/// True when the lowercased line contains any secret-suggestive keyword.
fn has_secret_context(line_lower: &str) -> bool {
    SECRET_HINTS.iter().any(|hint| line_lower.contains(hint))
}

/// Finds single- and double-quoted literals of candidate length, reporting
/// the 1-based column of the value (not the quote).
fn extract_quoted(line: &str, add: &mut dyn FnMut(usize, &str)) {
    let bytes = line.as_bytes();
    for quote in [b'"', b'\''] {
        let mut i = 0;
        while i < bytes.len() {
            let Some(rel) = bytes[i..].iter().position(|&b| b == quote) else {
                break;
            };
            let start = i + rel;
            let Some(rel) = bytes[start + 1..].iter().position(|&b| b == quote) else {
                break;
            };
            let end = start + 1 + rel;
            let value = &line[start + 1..end];
            if value.len() >= MIN_CANDIDATE_LEN {
                add(start + 2, value);
            }
            i = end + 1;
        }
    }
}

/// Finds unquoted values after `=`, `:`, or `=>` separators. Quoted values
/// are left to `extract_quoted`; `==` comparisons and `::` paths are
/// skipped.
fn extract_assignment_rhs(line: &str, add: &mut dyn FnMut(usize, &str)) {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let rhs_start = if i + 1 < bytes.len() && bytes[i] == b'=' && bytes[i + 1] == b'>' {
            i + 2
        } else if bytes[i] == b'=' && (i == 0 || !matches!(bytes[i - 1], b'!' | b'<' | b'>')) {
            if i + 1 < bytes.len() && bytes[i + 1] == b'=' {
                i += 2;
                continue;
            }
            i + 1
        } else if bytes[i] == b':' && (i + 1 >= bytes.len() || bytes[i + 1] != b':') {
            i + 1
        } else {
            i += 1;
            continue;
        };

        let mut rhs_start = rhs_start;
        while rhs_start < bytes.len() && (bytes[rhs_start] == b' ' || bytes[rhs_start] == b'\t') {
            rhs_start += 1;
        }

        if rhs_start < bytes.len() && (bytes[rhs_start] == b'"' || bytes[rhs_start] == b'\'') {
            i = rhs_start + 1;
            continue;
        }

        let mut rhs_end = rhs_start;
        while rhs_end < bytes.len() && is_token_char(bytes[rhs_end]) {
            rhs_end += 1;
        }

        let token = &line[rhs_start..rhs_end];
        if token.len() >= MIN_CANDIDATE_LEN {
            add(rhs_start + 1, token);
        }

        i = rhs_end + 1;
    }
}

/// Characters that commonly appear in secret tokens.
fn is_token_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'+' | b'/' | b'=' | b'-' | b'_' | b'.')
}

/// Adds every match of `re` in `line` as a candidate at its 1-based column.
fn extract_regex_candidates(line: &str, re: &Regex, add: &mut dyn FnMut(usize, &str)) {
    for m in re.find_iter(line) {
        add(m.start() + 1, m.as_str());
    }
}

/// Rejects low-signal shapes before entropy scoring: URLs and all-lowercase
/// alphabetic strings exhibit misleadingly high character diversity without
/// being secrets.
fn is_likely_not_secret(s: &str) -> bool {
    let lower = s.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return true;
    }
    s.chars().all(|c| c.is_alphabetic() && c.is_lowercase())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::rule;
    use super::*;
    use proptest::prelude::*;

    const TOLERANCE: f64 = 1e-9;

    fn entropy_rule(id: &str) -> Rule {
        rule(id, "entropy", "")
    }

    fn run_on_line(line: &str) -> Vec<MatchResult> {
        EntropyMatcher.run(line.as_bytes(), &entropy_rule("SEC-E01"))
    }

    #[test]
    fn entropy_of_empty_string_is_zero() {
        assert_eq!(shannon_entropy(""), 0.0);
    }

    #[test]
    fn entropy_of_repeated_character_is_zero() {
        assert_eq!(shannon_entropy("aaaaaaaa"), 0.0);
        assert_eq!(shannon_entropy("zzzzzzzzzzzzzzzzzzzz"), 0.0);
    }

    #[test]
    fn entropy_of_abcd_is_two_bits() {
        assert!((shannon_entropy("abcd") - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn entropy_of_k_equal_symbols_is_log2_k() {
        // 8 distinct characters, each appearing twice.
        let s = "aabbccddeeffgghh";
        assert!((shannon_entropy(s) - 3.0).abs() < TOLERANCE);
        // 16 distinct characters, once each.
        let s = "0123456789abcdef";
        assert!((shannon_entropy(s) - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn entropy_is_symmetric_under_reordering() {
        let forward = "aK3jR8mZ2pL5nW9x";
        let reversed: String = forward.chars().rev().collect();
        assert!((shannon_entropy(forward) - shannon_entropy(&reversed)).abs() < TOLERANCE);
    }

    proptest! {
        #[test]
        fn single_symbol_strings_always_score_zero(len in 1usize..64) {
            let s = "q".repeat(len);
            prop_assert_eq!(shannon_entropy(&s), 0.0);
        }

        #[test]
        fn entropy_depends_only_on_frequencies(s in "[a-zA-Z0-9]{1,40}") {
            let reversed: String = s.chars().rev().collect();
            prop_assert!((shannon_entropy(&s) - shannon_entropy(&reversed)).abs() < TOLERANCE);
        }

        #[test]
        fn entropy_never_panics_on_arbitrary_input(s in ".*") {
            let e = shannon_entropy(&s);
            prop_assert!(e >= 0.0);
        }
    }

    #[test]
    fn flags_high_entropy_quoted_assignment() {
        let results = run_on_line(r#"config_val = "aK3jR8mZ2pL5nW9xQ4vB7yD1sF6hT0c""#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_text, "aK3jR8mZ2pL5nW9xQ4vB7yD1sF6hT0c");
        assert_eq!(results[0].line, 1);
        assert_eq!(results[0].column, 15);
    }

    #[test]
    fn urls_are_excluded_despite_high_diversity() {
        let results = run_on_line(r#"link = "https://example.com/api/v2/resources/items""#);
        assert!(results.is_empty());
    }

    #[test]
    fn all_lowercase_words_are_excluded() {
        let results = run_on_line(r#"word = "pneumonoultramicroscopic""#);
        assert!(results.is_empty());
    }

    #[test]
    fn context_boost_flags_borderline_candidate_next_to_hint() {
        // log2(16) = 4.0 sits inside (threshold - boost, threshold).
        let with_hint = run_on_line(r#"password = "aAbBcCdDeEfFgGhH""#);
        assert_eq!(with_hint.len(), 1);
        assert_eq!(with_hint[0].match_text, "aAbBcCdDeEfFgGhH");

        let without_hint = run_on_line(r#"config = "aAbBcCdDeEfFgGhH""#);
        assert!(without_hint.is_empty());
    }

    #[test]
    fn short_candidates_are_never_reported() {
        // 12 distinct characters would clear any boosted threshold by
        // diversity alone if length were ignored.
        let results = run_on_line(r#"secret = "aB3xK9mQ2pL5""#);
        assert!(results.is_empty());
    }

    #[test]
    fn unparsable_threshold_metadata_falls_back_to_default() {
        let line = r#"config_val = "aK3jR8mZ2pL5nW9xQ4vB7yD1sF6hT0c""#;
        let mut bad = entropy_rule("SEC-E02");
        bad.metadata
            .insert("entropy_threshold".into(), "not-a-number".into());
        let plain = entropy_rule("SEC-E03");

        let from_bad = EntropyMatcher.run(line.as_bytes(), &bad);
        let from_plain = EntropyMatcher.run(line.as_bytes(), &plain);
        assert_eq!(from_bad, from_plain);
        assert_eq!(from_bad.len(), 1);
    }

    #[test]
    fn custom_threshold_metadata_is_honored() {
        let line = r#"config = "aAbBcCdDeEfFgGhH""#;
        let mut lenient = entropy_rule("SEC-E04");
        lenient
            .metadata
            .insert("entropy_threshold".into(), "3.5".into());
        let results = EntropyMatcher.run(line.as_bytes(), &lenient);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn require_context_suppresses_hintless_lines() {
        let line = r#"config_val = "aK3jR8mZ2pL5nW9xQ4vB7yD1sF6hT0c""#;
        let mut strict = entropy_rule("SEC-E05");
        strict
            .metadata
            .insert("require_context".into(), "true".into());
        assert!(EntropyMatcher.run(line.as_bytes(), &strict).is_empty());

        let hinted = r#"api_key = "aK3jR8mZ2pL5nW9xQ4vB7yD1sF6hT0c""#;
        assert_eq!(EntropyMatcher.run(hinted.as_bytes(), &strict).len(), 1);
    }

    #[test]
    fn malformed_require_context_is_treated_as_false() {
        let line = r#"config_val = "aK3jR8mZ2pL5nW9xQ4vB7yD1sF6hT0c""#;
        let mut odd = entropy_rule("SEC-E06");
        odd.metadata.insert("require_context".into(), "yes!".into());
        assert_eq!(EntropyMatcher.run(line.as_bytes(), &odd).len(), 1);
    }

    #[test]
    fn unquoted_assignment_rhs_is_extracted() {
        let results = run_on_line("export val=aK3jR8mZ2pL5nW9xQ4vB7yD1sF6hT0c");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_text, "aK3jR8mZ2pL5nW9xQ4vB7yD1sF6hT0c");
    }

    #[test]
    fn overlapping_tokenizers_report_one_match() {
        // Quoted, base64, and hex tokenizers all see this 32-char hex
        // string at the same position; only one match may surface.
        let results = run_on_line(r#"key = "a1B2c3D4e5F6a7B8c9D0e1F2a3B4c5D6""#);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn reports_correct_line_numbers_across_content() {
        let content = format!(
            "first = 1\nsecond = 2\nval = \"{}\"\n",
            "aK3jR8mZ2pL5nW9xQ4vB7yD1sF6hT0c"
        );
        let results = EntropyMatcher.run(content.as_bytes(), &entropy_rule("SEC-E07"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].line, 3);
    }

    #[test]
    fn non_utf8_content_is_tolerated() {
        let mut content = vec![0xf0, 0x28, 0x8c, 0x28, b'\n'];
        content.extend_from_slice(br#"val = "aK3jR8mZ2pL5nW9xQ4vB7yD1sF6hT0c""#);
        let results = EntropyMatcher.run(&content, &entropy_rule("SEC-E08"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].line, 2);
    }

    #[test]
    fn double_equals_comparison_is_not_an_assignment() {
        let mut captured: Vec<(usize, String)> = Vec::new();
        let mut add = |col: usize, text: &str| captured.push((col, text.to_string()));
        extract_assignment_rhs("if x == aK3jR8mZ2pL5nW9xQ4vB7yD1sF6hT0c {", &mut add);
        assert!(captured.is_empty());
    }

    #[test]
    fn quoted_extraction_reports_value_column() {
        let mut captured: Vec<(usize, String)> = Vec::new();
        let mut add = |col: usize, text: &str| captured.push((col, text.to_string()));
        extract_quoted(r#"k = "0123456789abcdefgh""#, &mut add);
        assert_eq!(captured, vec![(6, "0123456789abcdefgh".to_string())]);
    }
}
