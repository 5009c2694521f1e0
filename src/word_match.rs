//! # Word Comparator Module
//!
//! ## Purpose
//! Multi-pass fuzzy word-to-word matching with prefix and abbreviation
//! awareness. This is the workhorse underneath `compare_by_words`, used by
//! the corporate-name matcher whenever a single Jaro-Winkler/Levenshtein
//! comparison of the whole string is too coarse (e.g. "PNC Financial
//! Services Group" vs "PNC Financial Service G.").
//!
//! ## Key Features
//! - Six decreasing-strictness passes assigning words of A to words of B.
//! - Prefix-aware comparison for truncated/abbreviated trailing words.
//! - A simple "is this a plausible abbreviation" subsequence check.

use regex::Regex;
use std::sync::OnceLock;

const TRAILING_PUNCTUATION: &[char] = &['.', ';', ':', '/', '$', '%', '&', '"', '!'];

/// One assignment produced by `match_word_lists`: index into A, index into
/// B, the score, and whether this word was matched via the prefix branch.
#[derive(Debug, Clone)]
pub struct WordAssignment {
    pub a_index: usize,
    pub b_index: usize,
    pub score: f64,
    pub is_prefix_match: bool,
}

/// Result of running all six passes.
#[derive(Debug, Clone, Default)]
pub struct WordListMatch {
    pub assignments: Vec<WordAssignment>,
    pub in_order: bool,
}

fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (strsim::levenshtein(a, b) as f64 / max_len as f64)
}

fn jaro_winkler(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(a, b)
}

/// True iff the shorter string's first character equals the longer's first,
/// and every subsequent character of the shorter appears in order in the
/// longer at strictly increasing positions (a loose "is this an acronym of
/// that" check, e.g. "PNC" against "P and C corp" is not tested here, only
/// character subsequences like "IBM" within "International Business
/// Machines" initials are handled by the matcher's own initial-letter pass).
pub fn is_likely_abbreviation(short: &str, long: &str) -> bool {
    let short_chars: Vec<char> = short.chars().collect();
    let long_chars: Vec<char> = long.chars().collect();
    if short_chars.is_empty() || long_chars.is_empty() {
        return false;
    }
    if short_chars[0].to_ascii_uppercase() != long_chars[0].to_ascii_uppercase() {
        return false;
    }

    let mut cursor = 1usize;
    for &sc in short_chars.iter().skip(1) {
        let mut found = false;
        while cursor < long_chars.len() {
            let lc = long_chars[cursor];
            cursor += 1;
            if lc.to_ascii_uppercase() == sc.to_ascii_uppercase() {
                found = true;
                break;
            }
        }
        if !found {
            return false;
        }
    }
    true
}

fn strip_trailing_punctuation(s: &str) -> &str {
    s.trim_end_matches(TRAILING_PUNCTUATION)
}

/// Compare two individual words. `allow_prefix` permits a truncated-word
/// match (e.g. "SERVICE" vs "SERVICES"); `can_use_abbrev` permits the
/// subsequence-abbreviation bonus.
pub fn compare_word(w1: &str, w2: &str, allow_prefix: bool, can_use_abbrev: bool) -> f64 {
    if w1.is_empty() || w2.is_empty() {
        return if w1.is_empty() && w2.is_empty() { 1.0 } else { 0.0 };
    }

    let len1 = w1.chars().count();
    let len2 = w2.chars().count();

    if len1 <= 2 && len2 <= 2 {
        return if w1.eq_ignore_ascii_case(w2) { 1.0 } else { 0.0 };
    }

    let mut best = levenshtein_similarity(w1, w2).min(jaro_winkler(w1, w2));

    if allow_prefix {
        let (shorter, longer, shorter_len, longer_len) = if len1 <= len2 {
            (w1, w2, len1, len2)
        } else {
            (w2, w1, len2, len1)
        };

        if longer_len as f64 >= shorter_len as f64 * 1.2 {
            let longer_trimmed = strip_trailing_punctuation(longer);
            let longer_chars: Vec<char> = longer_trimmed.chars().collect();
            let shorter_chars: Vec<char> = shorter.chars().collect();

            if longer_chars.len() >= shorter_chars.len() {
                let prefix: String = longer_chars[..shorter_chars.len()].iter().collect();

                let mut prefix_score = if shorter_chars.len() <= 3 {
                    if prefix.eq_ignore_ascii_case(shorter) { 1.0 } else { 0.0 }
                } else {
                    levenshtein_similarity(&prefix, shorter).min(jaro_winkler(&prefix, shorter))
                };

                let last_char = shorter_chars[shorter_chars.len() - 1].to_ascii_uppercase();
                let longer_tail_has_char = longer_chars
                    .iter()
                    .any(|c| c.to_ascii_uppercase() == last_char);
                if !longer_tail_has_char {
                    prefix_score *= 0.8;
                }

                best = best.max(prefix_score);
            }
        }
    }

    if can_use_abbrev {
        let (shorter, longer) = if len1 <= len2 { (w1, w2) } else { (w2, w1) };
        let shorter_stripped = strip_trailing_punctuation(shorter);
        let longer_stripped = strip_trailing_punctuation(longer);
        if is_likely_abbreviation(shorter_stripped, longer_stripped) {
            best = best.max(0.95);
        }
    }

    if best < 0.6 {
        0.0
    } else {
        best
    }
}

/// Thresholds and prefix-matching toggles for each of the six passes.
const PASSES: [(f64, bool); 6] = [
    (0.98, false),
    (0.98, true),
    (0.95, true),
    (0.90, true),
    (0.80, true),
    (0.60, true),
];

/// Assign each word of `a` to the best unmatched word of `b`, over six
/// decreasing-strictness passes. Abbreviation bonuses are only offered while
/// the assignment sequence so far remains in index order.
pub fn match_word_lists(a: &[String], b: &[String]) -> WordListMatch {
    let mut assignments: Vec<Option<WordAssignment>> = vec![None; a.len()];
    let mut b_used = vec![false; b.len()];
    let mut in_order = true;
    let mut last_b_index: Option<usize> = None;

    for &(min_score, allow_prefix) in PASSES.iter() {
        for (ai, aw) in a.iter().enumerate() {
            if assignments[ai].is_some() {
                continue;
            }
            let mut best: Option<(usize, f64, bool)> = None;
            for (bi, bw) in b.iter().enumerate() {
                if b_used[bi] {
                    continue;
                }
                let score = compare_word(aw, bw, allow_prefix, in_order);
                if score < min_score {
                    continue;
                }
                let is_prefix = allow_prefix
                    && !aw.eq_ignore_ascii_case(bw)
                    && score < 1.0;
                if best.map(|(_, s, _)| score > s).unwrap_or(true) {
                    best = Some((bi, score, is_prefix));
                }
            }
            if let Some((bi, score, is_prefix)) = best {
                b_used[bi] = true;
                if let Some(last) = last_b_index {
                    if bi < last {
                        in_order = false;
                    }
                }
                last_b_index = Some(bi);
                assignments[ai] = Some(WordAssignment {
                    a_index: ai,
                    b_index: bi,
                    score,
                    is_prefix_match: is_prefix,
                });
            }
        }
    }

    WordListMatch {
        assignments: assignments.into_iter().flatten().collect(),
        in_order,
    }
}

fn split_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s\-/]+").unwrap())
}

fn tokenize_for_words(s: &str) -> Vec<String> {
    split_regex()
        .split(&s.replace('&', ""))
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Compare two names word-by-word rather than as flat strings. Returns 0.0
/// when the names are too lopsided in word count to compare meaningfully.
pub fn compare_by_words(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize_for_words(a);
    let tokens_b = tokenize_for_words(b);

    let (shorter, longer) = if tokens_a.len() <= tokens_b.len() {
        (tokens_a, tokens_b)
    } else {
        (tokens_b, tokens_a)
    };

    if shorter.is_empty() || longer.is_empty() {
        return 0.0;
    }
    if 2 * shorter.len() <= longer.len() {
        return 0.0;
    }

    let shorter: Vec<String> = shorter
        .iter()
        .map(|t| crate::text::normalize_preserve_specials(t, crate::text::DiacriticPolicy::Raw))
        .collect();
    let longer: Vec<String> = longer
        .iter()
        .map(|t| crate::text::normalize_preserve_specials(t, crate::text::DiacriticPolicy::Raw))
        .collect();

    let result = match_word_lists(&shorter, &longer);

    let min_required = (shorter.len() as f64 / 2.0).ceil() as usize;
    if result.assignments.len() < min_required {
        return 0.0;
    }
    if !result.assignments.iter().any(|m| !m.is_prefix_match) {
        return 0.0;
    }

    let matched_chars: usize = result
        .assignments
        .iter()
        .map(|m| shorter[m.a_index].chars().count())
        .sum();
    let total_chars: usize = shorter.iter().map(|t| t.chars().count()).sum();
    if total_chars == 0 || (matched_chars as f64 / total_chars as f64) < 0.5 {
        return 0.0;
    }

    let matched_indices: std::collections::HashSet<usize> =
        result.assignments.iter().map(|m| m.a_index).collect();

    let mut score_sum = 0.0;
    for (i, _) in shorter.iter().enumerate() {
        if let Some(m) = result.assignments.iter().find(|m| m.a_index == i) {
            score_sum += if m.is_prefix_match {
                (m.score - 0.1).max(0.0)
            } else {
                m.score
            };
        } else {
            score_sum += 0.4;
        }
    }
    let _ = matched_indices;
    let mut score = score_sum / shorter.len() as f64;

    let unmatched_b = longer.len() - result.assignments.len();
    let free_unmatched_b = result.assignments.len() / 3;
    let penalized_unmatched_b = unmatched_b.saturating_sub(free_unmatched_b);
    score *= 0.95f64.powi(penalized_unmatched_b as i32);

    if !result.in_order {
        let order_violations = count_order_violations(&result.assignments);
        score *= 0.98f64.powi(order_violations as i32);
    }

    score.clamp(0.0, 1.0)
}

fn count_order_violations(assignments: &[WordAssignment]) -> usize {
    let mut sorted = assignments.to_vec();
    sorted.sort_by_key(|a| a.a_index);
    let mut violations = 0;
    let mut last_b = None;
    for a in &sorted {
        if let Some(last) = last_b {
            if a.b_index < last {
                violations += 1;
            }
        }
        last_b = Some(a.b_index);
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_word_scores_one() {
        assert_eq!(compare_word("GROUP", "GROUP", false, false), 1.0);
    }

    #[test]
    fn short_words_use_equality_only() {
        assert_eq!(compare_word("GM", "GN", false, false), 0.0);
        assert_eq!(compare_word("GM", "GM", false, false), 1.0);
    }

    #[test]
    fn prefix_match_handles_truncation() {
        let score = compare_word("SERVICE", "SERVICES", true, false);
        assert!(score > 0.6, "expected prefix match above cutoff, got {score}");
    }

    #[test]
    fn abbreviation_subsequence_detected() {
        assert!(is_likely_abbreviation("IBM", "International Business Machines"));
        assert!(!is_likely_abbreviation("IBX", "International Business Machines"));
    }

    #[test]
    fn compare_by_words_rejects_lopsided_lengths() {
        assert_eq!(compare_by_words("A B", "A B C D E F"), 0.0);
    }

    #[test]
    fn compare_by_words_scores_near_matches_highly() {
        let score = compare_by_words(
            "PNC FINANCIAL SERVICES GROUP",
            "PNC FINANCIAL SERVICE G",
        );
        assert!(score > 0.5, "expected a reasonably high score, got {score}");
    }

    #[test]
    fn compare_by_words_empty_inputs() {
        assert_eq!(compare_by_words("", "ANYTHING"), 0.0);
        assert_eq!(compare_by_words("", ""), 0.0);
    }
}
