//! # Legal-Form Retriever
//!
//! ## Purpose
//! Identifies which catalog legal form appears in a name, under a given
//! country, and can produce the name with that specific suffix removed,
//! restoring the original tokens (casing, punctuation) wherever a token
//! survived the normalization pass untouched.
//!
//! ## Pipeline
//! 1. **Normalize**: casefold-neutral tokenization (`&`/`+` -> "U", light
//!    punctuation stripped, parenthesized groups dropped, whitespace
//!    collapsed), each token diacritic-stripped and lower-cased, "UND" ->
//!    "U". Multiword replacement rules are then applied right-to-left,
//!    fuzzy-matching each rule token against the corresponding input token
//!    (Levenshtein similarity >= 0.85, or exact equality for very short
//!    tokens), splitting an input token into a retained head plus the
//!    matched suffix when the rule's first token is only a *suffix* of that
//!    input token.
//! 2. **Match**: search the country's catalog, longest entry first, for a
//!    trailing window of normalized tokens whose fuzzy comparison to the
//!    entry's own tokenized form succeeds. Legal forms are suffixes in
//!    practice, so matching anchors at the end of the token list; a
//!    concatenated-suffix fallback catches forms glued onto the last token
//!    without whitespace.
//! 3. **Remove**: drop the matched token window; every surviving position is
//!    either restored verbatim from the original (untouched) token, or, if
//!    it is a fragment produced by a split/merge, emitted as its normalized
//!    fragment text (see `split_tracker`).
//!
//! Malformed or missing catalog/rule inputs never cause this module to
//! error: a missing country simply yields `None` from `retrieve_legal_form`,
//! and normalization always terminates (cycle detection + a depth cap of 50
//! guard the rule-application loop).

use crate::legal_forms::catalog::LegalFormCatalog;
use crate::legal_forms::cleaner;
use crate::legal_forms::replacement::LegalFormReplacementRule;
use crate::legal_forms::split_tracker::SplitTracker;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const MAX_RULE_APPLICATIONS: usize = 50;

/// Finds and removes the catalog legal form present in a name, for a given
/// country, borrowing the catalog and replacement rules for its lifetime.
pub struct LegalFormRetriever<'a> {
    catalog: &'a LegalFormCatalog,
    rules: &'a [LegalFormReplacementRule],
}

struct InternalMatch {
    canonical: String,
    start: usize,
    end: usize,
    original_tokens: Vec<String>,
    working_tokens: Vec<String>,
    tracker: SplitTracker,
}

fn paren_groups_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^()]*\)").unwrap())
}

fn pretokenize(name: &str) -> Vec<String> {
    let mut s = name.replace('&', " U ").replace('+', " U ");
    s = paren_groups_regex().replace_all(&s, " ").to_string();
    for punct in [';', '$', '.', ',', '_', '#', '*', '§', '"', '!', '?', '-'] {
        s = s.replace(punct, " ");
    }
    s.split_whitespace().map(|t| t.to_string()).collect()
}

fn normalize_rule_token(token: &str) -> String {
    let normalized = crate::text::normalize_stripped(token, crate::text::DiacriticPolicy::Raw).to_lowercase();
    if normalized == "und" {
        "u".to_string()
    } else {
        normalized
    }
}

/// Fuzzy-compare a (lower-cased, diacritic-stripped) input token against a
/// rule/catalog pattern token: exact for very short tokens, Levenshtein
/// similarity >= 0.85 otherwise.
fn token_fuzzy_eq(input_token: &str, pattern_token: &str) -> bool {
    if pattern_token.chars().count() <= 2 {
        input_token.eq_ignore_ascii_case(pattern_token)
    } else {
        let max_len = input_token.chars().count().max(pattern_token.chars().count());
        if max_len == 0 {
            return true;
        }
        1.0 - (strsim::levenshtein(input_token, pattern_token) as f64 / max_len as f64) >= 0.85
    }
}

fn try_apply_one_rule(
    tokens: &mut Vec<String>,
    tracker: &mut SplitTracker,
    rules: &[LegalFormReplacementRule],
) -> bool {
    for start in (0..tokens.len()).rev() {
        for rule in rules {
            let k = rule.word_count();
            if k == 0 || start + k > tokens.len() {
                continue;
            }
            let first_pattern = &rule.pattern_tokens[0];
            let first_token = &tokens[start];

            let mut split_head: Option<String> = None;
            let window_ok = if token_fuzzy_eq(first_token, first_pattern) {
                true
            } else if first_token.chars().count() > first_pattern.chars().count() {
                let tail_start = first_token.len().saturating_sub(first_pattern.len());
                let tail = &first_token[tail_start..];
                if token_fuzzy_eq(tail, first_pattern) {
                    split_head = Some(first_token[..tail_start].to_string());
                    true
                } else {
                    false
                }
            } else {
                false
            };
            if !window_ok {
                continue;
            }

            let rest_ok = rule.pattern_tokens[1..]
                .iter()
                .enumerate()
                .all(|(i, pat)| token_fuzzy_eq(&tokens[start + 1 + i], pat));
            if !rest_ok {
                continue;
            }

            let original_index = tracker.origin_of(start).map(|o| o.original_index).unwrap_or(start);

            let mut new_tokens: Vec<String> = tokens[..start].to_vec();
            let mut new_tracker = SplitTracker::default();
            for i in 0..start {
                let origin = tracker.origin_of(i).unwrap();
                if origin.is_fragment {
                    new_tracker.push_merge(origin.original_index);
                } else {
                    new_tracker.push_whole(origin.original_index);
                }
            }

            match split_head {
                Some(head) if !head.is_empty() => {
                    new_tokens.push(head);
                    new_tokens.push(rule.replacement.clone());
                    new_tracker.push_split(original_index);
                }
                _ => {
                    new_tokens.push(rule.replacement.clone());
                    new_tracker.push_merge(original_index);
                }
            }

            new_tokens.extend_from_slice(&tokens[start + k..]);
            for i in (start + k)..tokens.len() {
                let origin = tracker.origin_of(i).unwrap();
                if origin.is_fragment {
                    new_tracker.push_merge(origin.original_index);
                } else {
                    new_tracker.push_whole(origin.original_index);
                }
            }

            *tokens = new_tokens;
            *tracker = new_tracker;
            return true;
        }
    }
    false
}

fn apply_rules(
    mut tokens: Vec<String>,
    mut tracker: SplitTracker,
    rules: &[LegalFormReplacementRule],
) -> (Vec<String>, SplitTracker) {
    let mut visited = HashSet::new();
    for _ in 0..MAX_RULE_APPLICATIONS {
        let snapshot = tokens.join("\u{1}");
        if !visited.insert(snapshot) {
            break;
        }
        if !try_apply_one_rule(&mut tokens, &mut tracker, rules) {
            break;
        }
    }
    (tokens, tracker)
}

fn tokenize_catalog_entry(text: &str) -> Vec<String> {
    text.split_whitespace().map(normalize_rule_token).collect()
}

fn find_match(
    tokens: &[String],
    entries: &[&crate::legal_forms::catalog::LegalFormEntry],
) -> Option<(usize, usize, String)> {
    for entry in entries {
        let entry_tokens = tokenize_catalog_entry(&entry.text);
        let k = entry_tokens.len();
        if k == 0 || k > tokens.len() {
            continue;
        }
        let start = tokens.len() - k;
        if entry_tokens
            .iter()
            .enumerate()
            .all(|(i, et)| token_fuzzy_eq(&tokens[start + i], et))
        {
            return Some((start, tokens.len(), entry.text.clone()));
        }
    }

    let concat: String = tokens.concat();
    for entry in entries {
        let entry_concat: String = tokenize_catalog_entry(&entry.text).concat();
        if !entry_concat.is_empty() && concat.len() > entry_concat.len() && concat.ends_with(&entry_concat) {
            return Some((tokens.len().saturating_sub(1), tokens.len(), entry.text.clone()));
        }
    }

    None
}

impl<'a> LegalFormRetriever<'a> {
    pub fn new(catalog: &'a LegalFormCatalog, rules: &'a [LegalFormReplacementRule]) -> Self {
        Self { catalog, rules }
    }

    fn find_internal(&self, name: &str, country: &str) -> Option<InternalMatch> {
        if name.trim().is_empty() {
            return None;
        }
        let entries = self.catalog.entries_for(country);
        if entries.is_empty() {
            return None;
        }

        let original_tokens = pretokenize(name);
        if original_tokens.is_empty() {
            return None;
        }
        let normalized_tokens: Vec<String> = original_tokens.iter().map(|t| normalize_rule_token(t)).collect();
        let (working_tokens, tracker) =
            apply_rules(normalized_tokens, SplitTracker::identity(original_tokens.len()), self.rules);

        let (start, end, canonical) = find_match(&working_tokens, &entries)?;

        Some(InternalMatch {
            canonical,
            start,
            end,
            original_tokens,
            working_tokens,
            tracker,
        })
    }

    /// Identify the specific legal form present in `name` under `country`,
    /// if any. Returns the canonical catalog text (e.g. `"GMBH"`), not a
    /// position.
    pub fn retrieve_legal_form(&self, name: &str, country: &str) -> Option<String> {
        self.find_internal(name, country).map(|m| m.canonical)
    }

    /// `name` with its specific legal-form suffix removed, restoring
    /// original tokens outside the matched window. Falls back to
    /// `cleaner::clean` when no legal form is found, so the result is always
    /// defined (never an error, per §4.3 failure modes).
    pub fn company_name_without_legal_form(&self, name: &str, country: &str) -> String {
        match self.find_internal(name, country) {
            None => cleaner::clean(name),
            Some(m) => reconstruct_without_match(&m),
        }
    }
}

fn reconstruct_without_match(m: &InternalMatch) -> String {
    let mut parts = Vec::new();
    for pos in 0..m.tracker.len() {
        if pos >= m.start && pos < m.end {
            continue;
        }
        let origin = m.tracker.origin_of(pos).expect("tracker covers every working token");
        if origin.is_fragment {
            parts.push(m.working_tokens[pos].clone());
        } else if let Some(original) = m.original_tokens.get(origin.original_index) {
            parts.push(original.clone());
        }
    }
    parts.join(" ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legal_forms::catalog::LegalFormCatalog;
    use std::io::Write;
    use std::path::Path;

    fn write_temp(content: &str, suffix: &str) -> tempfile::TempPath {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.into_temp_path()
    }

    fn de_us_catalog() -> LegalFormCatalog {
        let json = r#"[
            {"legal_form_id":"de.gmbh","short_name":"GmbH","country":"DE"},
            {"legal_form_id":"de.ag","short_name":"AG","country":"DE"},
            {"legal_form_id":"us.inc","short_name":"Inc","country":"US"},
            {"legal_form_id":"us.llc","short_name":"LLC","country":"US"},
            {"legal_form_id":"us.holdings","short_name":"Holdings","country":"US"},
            {"legal_form_id":"us.holding","short_name":"Holding","country":"US"},
            {"legal_form_id":"us.group","short_name":"Group","country":"US"}
        ]"#;
        let json_path = write_temp(json, ".json");
        let appendix_path = write_temp("", ".txt");
        LegalFormCatalog::load(&json_path, &appendix_path).unwrap()
    }

    #[test]
    fn retrieves_simple_trailing_legal_form() {
        let catalog = de_us_catalog();
        let retriever = LegalFormRetriever::new(&catalog, &[]);
        assert_eq!(retriever.retrieve_legal_form("Siemens AG", "DE"), Some("AG".to_string()));
        assert_eq!(retriever.retrieve_legal_form("Acme Inc", "US"), Some("INC".to_string()));
    }

    #[test]
    fn missing_country_returns_none() {
        let catalog = de_us_catalog();
        let retriever = LegalFormRetriever::new(&catalog, &[]);
        assert_eq!(retriever.retrieve_legal_form("Acme Inc", "ZZ"), None);
    }

    #[test]
    fn removal_restores_prefix_verbatim() {
        let catalog = de_us_catalog();
        let retriever = LegalFormRetriever::new(&catalog, &[]);
        assert_eq!(retriever.company_name_without_legal_form("Siemens AG", "DE"), "Siemens");
        assert_eq!(retriever.company_name_without_legal_form("PayPal Holdings", "US"), "PayPal");
        assert_eq!(retriever.company_name_without_legal_form("PayPal Holding", "US"), "PayPal");
    }

    #[test]
    fn no_match_falls_back_to_clean() {
        let catalog = de_us_catalog();
        let retriever = LegalFormRetriever::new(&catalog, &[]);
        assert_eq!(
            retriever.company_name_without_legal_form("Just A Name", "US"),
            "Just A Name"
        );
    }

    #[test]
    fn empty_name_yields_no_legal_form() {
        let catalog = de_us_catalog();
        let retriever = LegalFormRetriever::new(&catalog, &[]);
        assert_eq!(retriever.retrieve_legal_form("   ", "DE"), None);
    }

    #[test]
    fn rule_split_produces_head_and_replacement_tokens() {
        // "Finanzgruppe" -> head "Finanz" + canonical "gruppe", then
        // catalog recognizes "gruppe" mapped to "Group" style entries if
        // present; here we just check the rule application doesn't panic
        // and produces a plausible token split.
        let catalog = de_us_catalog();
        let rules = vec![crate::legal_forms::replacement::LegalFormReplacementRule {
            pattern_tokens: vec!["gruppe".to_string()],
            replacement: "group".to_string(),
        }];
        let retriever = LegalFormRetriever::new(&catalog, &rules);
        // Should not panic and should still find a legal form if present at the tail.
        let _ = retriever.retrieve_legal_form("Acme Finanzgruppe", "US");
    }

    #[test]
    fn unknown_path_catalog_yields_no_forms_ever() {
        let catalog =
            LegalFormCatalog::load(Path::new("/no/such.json"), Path::new("/no/such.txt")).unwrap();
        let retriever = LegalFormRetriever::new(&catalog, &[]);
        assert_eq!(retriever.retrieve_legal_form("Acme Inc", "US"), None);
    }
}
