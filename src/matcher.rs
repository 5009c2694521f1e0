//! # Corporate Name Matcher
//!
//! ## Purpose
//! The top-level pairwise scorer: given two raw company names (and
//! optional country codes), produces a similarity score in `(0.85, 1.0]`
//! or "no opinion". Combines the text utilities, legal-form retriever, and
//! word comparator behind a priority-ordered cascade of cheap exact checks
//! first, expensive fuzzy checks last.
//!
//! Every branch is documented at the call site with the rule number it
//! implements, since the cascade's ordering (not just each branch's logic)
//! determines the final score.

use crate::legal_forms::{cleaner, LegalFormCatalog, LegalFormReplacementRule, LegalFormRetriever};
use crate::text;
use crate::word_match;
use regex::Regex;
use std::sync::OnceLock;

const LEGAL_FORM_MISMATCH_PENALTY: f64 = 0.9;

/// Holds the catalog and replacement rules a matcher needs to retrieve and
/// subtract legal forms. Cheap to construct from borrowed data; intended to
/// be built once per catalog load and reused across many `match_names`
/// calls.
pub struct CorporateNameMatcher<'a> {
    catalog: &'a LegalFormCatalog,
    rules: &'a [LegalFormReplacementRule],
}

fn stretch_jaro_winkler(raw: f64) -> f64 {
    1.0 - 2.5 * (1.0 - raw)
}

fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (strsim::levenshtein(a, b) as f64 / max_len as f64)
}

fn clamp_high_levenshtein(score: f64) -> f64 {
    if score >= 0.95 {
        0.95
    } else {
        score
    }
}

fn dot_split_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s\-]+").unwrap())
}

/// Tokenize on whitespace/hyphen runs, then further split each token on `.`
/// while keeping the dot attached to the token that preceded it (so "G."
/// stays "G." rather than becoming "G" + "").
fn tokenize_with_dots(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    for chunk in dot_split_regex().split(s) {
        if chunk.is_empty() {
            continue;
        }
        let mut current = String::new();
        for ch in chunk.chars() {
            current.push(ch);
            if ch == '.' {
                out.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

fn is_single_letter_abbrev(token: &str) -> Option<char> {
    let trimmed = token.trim_end_matches('.');
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    if chars.next().is_none() {
        Some(first.to_ascii_uppercase())
    } else {
        None
    }
}

fn token_pair_score(a: &str, b: &str) -> Option<f64> {
    if a.eq_ignore_ascii_case(b) || text::equal_diacritic_insensitive(a, b) {
        return Some(1.0);
    }
    if let (Some(ca), Some(cb)) = (is_single_letter_abbrev(a), is_single_letter_abbrev(b)) {
        if ca == cb {
            return Some(0.9);
        }
    }
    let jw = strsim::jaro_winkler(a, b);
    if jw >= 0.95 {
        return Some(jw);
    }
    None
}

/// One directional pass of §4.5.1: pair tokens index-by-index up to the
/// shorter length; any failing pair aborts the whole direction.
fn match_word_sequence(a: &[String], b: &[String]) -> Option<f64> {
    let min_len = a.len().min(b.len());
    let max_len = a.len().max(b.len());
    if min_len == 0 {
        return None;
    }
    if min_len as f64 <= max_len as f64 / 2.0 {
        return None;
    }

    let mut sum = 0.0;
    for i in 0..min_len {
        sum += token_pair_score(&a[i], &b[i])?;
    }

    let denom = min_len as f64 + (max_len - min_len) as f64 * 0.2;
    Some(sum / denom)
}

fn ordered_word_match(cleaned1: &str, cleaned2: &str) -> Option<f64> {
    let tokens1 = tokenize_with_dots(cleaned1);
    let tokens2 = tokenize_with_dots(cleaned2);
    if tokens1.len() <= 1 || tokens2.len() <= 1 {
        return None;
    }

    let forward = match_word_sequence(&tokens1, &tokens2);
    let backward = match_word_sequence(&tokens2, &tokens1);
    match (forward, backward) {
        (Some(f), Some(b)) => Some(f.max(b)),
        (Some(f), None) => Some(f),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// §4.5.2: concatenated initials of one side equal the other side's bare
/// alphabetic upper form.
fn initial_letter_match(cleaned1: &str, cleaned2: &str) -> bool {
    let tokens1 = word_match_tokenize(cleaned1);
    let tokens2 = word_match_tokenize(cleaned2);
    if tokens1.is_empty() || tokens2.is_empty() {
        return false;
    }

    let initials1: String = tokens1
        .iter()
        .filter_map(|t| t.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let initials2: String = tokens2
        .iter()
        .filter_map(|t| t.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let alpha_only = |s: &str| -> String {
        s.chars().filter(|c| c.is_ascii_alphabetic()).map(|c| c.to_ascii_uppercase()).collect()
    };

    alpha_only(cleaned1) == initials2 || alpha_only(cleaned2) == initials1
}

fn word_match_tokenize(s: &str) -> Vec<String> {
    s.split_whitespace().map(|t| t.to_string()).collect()
}

struct LegalFormOutcome {
    cleaned1: String,
    cleaned2: String,
    mismatch_penalty: f64,
}

impl<'a> CorporateNameMatcher<'a> {
    pub fn new(catalog: &'a LegalFormCatalog, rules: &'a [LegalFormReplacementRule]) -> Self {
        Self { catalog, rules }
    }

    fn reconcile_legal_forms(&self, name1: &str, name2: &str, country: &str) -> LegalFormOutcome {
        let retriever = LegalFormRetriever::new(self.catalog, self.rules);
        let form1 = retriever.retrieve_legal_form(name1, country);
        let form2 = retriever.retrieve_legal_form(name2, country);

        let mut mismatch_penalty = 1.0;
        let (cleaned1, cleaned2) = match (&form1, &form2) {
            (Some(f1), Some(f2)) if f1 == f2 => (
                retriever.company_name_without_legal_form(name1, country),
                retriever.company_name_without_legal_form(name2, country),
            ),
            (Some(_), Some(_)) => {
                mismatch_penalty = LEGAL_FORM_MISMATCH_PENALTY;
                (
                    retriever.company_name_without_legal_form(name1, country),
                    retriever.company_name_without_legal_form(name2, country),
                )
            }
            (Some(_), None) | (None, Some(_)) => (
                retriever.company_name_without_legal_form(name1, country),
                retriever.company_name_without_legal_form(name2, country),
            ),
            (None, None) => (cleaner::clean(name1), cleaner::clean(name2)),
        };

        LegalFormOutcome {
            cleaned1,
            cleaned2,
            mismatch_penalty,
        }
    }

    /// §4.5 full pipeline. `country1`/`country2` default to `"DE"` when
    /// empty, matching the reference behavior.
    pub fn match_names(
        &self,
        name1: &str,
        name2: &str,
        country1: &str,
        country2: &str,
    ) -> Option<f64> {
        let n1 = name1.trim().to_uppercase();
        let n2 = name2.trim().to_uppercase();
        if n1.is_empty() || n2.is_empty() {
            return None;
        }

        if text::equal_diacritic_insensitive(&n1, &n2) {
            return Some(1.0);
        }

        let stretched = stretch_jaro_winkler(strsim::jaro_winkler(&n1, &n2));
        if stretched >= 0.95 {
            return Some(stretched);
        }

        if n1.chars().count() > 2 && n2.chars().count() > 2 {
            let raw_lev = levenshtein_similarity(&n1, &n2);
            let clamped = clamp_high_levenshtein(raw_lev);
            if clamped >= 0.95 {
                return Some(clamped);
            }
        }

        let (c1, c2) = reconcile_countries(country1, country2);

        let outcome = self.reconcile_legal_forms(&n1, &n2, &c1);
        if outcome.cleaned1.trim().is_empty() || outcome.cleaned2.trim().is_empty() {
            return None;
        }

        if text::equal_diacritic_insensitive(&outcome.cleaned1, &outcome.cleaned2) {
            return Some(0.99);
        }

        if let Some(ordered) = ordered_word_match(&outcome.cleaned1, &outcome.cleaned2) {
            if ordered >= 0.85 {
                return Some(ordered);
            }
        }

        let word_score_l = word_match::compare_by_words(&outcome.cleaned1, &outcome.cleaned2);

        if initial_letter_match(&outcome.cleaned1, &outcome.cleaned2) {
            return Some(0.5);
        }

        let cleaned_jw = stretch_jaro_winkler(strsim::jaro_winkler(&outcome.cleaned1, &outcome.cleaned2))
            .clamp(0.0, 1.0);
        let cleaned_lev = levenshtein_similarity(&outcome.cleaned1, &outcome.cleaned2);
        let raw_lev = levenshtein_similarity(&n1, &n2);

        let penalized_jw = cleaned_jw * outcome.mismatch_penalty;
        if penalized_jw >= 0.9 && cleaned_lev >= word_score_l {
            return Some(penalized_jw);
        }

        if word_score_l >= raw_lev && word_score_l >= cleaned_lev && word_score_l >= 0.85 {
            return Some(word_score_l * outcome.mismatch_penalty);
        }

        if raw_lev >= 0.85 {
            return Some(raw_lev * outcome.mismatch_penalty);
        }

        if cleaned_lev >= 0.85 {
            return Some(cleaned_lev * outcome.mismatch_penalty);
        }

        let _ = c2;
        None
    }
}

/// If one side is empty, copy the other's country; if both present and
/// different, null both out and fall back to "DE".
fn reconcile_countries(country1: &str, country2: &str) -> (String, String) {
    let c1 = country1.trim();
    let c2 = country2.trim();
    match (c1.is_empty(), c2.is_empty()) {
        (true, true) => ("DE".to_string(), "DE".to_string()),
        (true, false) => (c2.to_string(), c2.to_string()),
        (false, true) => (c1.to_string(), c1.to_string()),
        (false, false) => {
            if c1.eq_ignore_ascii_case(c2) {
                (c1.to_string(), c2.to_string())
            } else {
                ("DE".to_string(), "DE".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str, suffix: &str) -> tempfile::TempPath {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.into_temp_path()
    }

    fn test_catalog() -> LegalFormCatalog {
        let json = r#"[
            {"legal_form_id":"de.gmbh","short_name":"GmbH","country":"DE"},
            {"legal_form_id":"de.ag","short_name":"AG","country":"DE"},
            {"legal_form_id":"us.inc","short_name":"Inc","country":"US"},
            {"legal_form_id":"us.holdings","short_name":"Holdings","country":"US"},
            {"legal_form_id":"us.holding","short_name":"Holding","country":"US"}
        ]"#;
        let json_path = write_temp(json, ".json");
        let appendix_path = write_temp("", ".txt");
        LegalFormCatalog::load(&json_path, &appendix_path).unwrap()
    }

    #[test]
    fn identical_names_score_one() {
        let catalog = test_catalog();
        let matcher = CorporateNameMatcher::new(&catalog, &[]);
        assert_eq!(matcher.match_names("Acme Corp", "Acme Corp", "US", "US"), Some(1.0));
    }

    #[test]
    fn empty_name_yields_no_opinion() {
        let catalog = test_catalog();
        let matcher = CorporateNameMatcher::new(&catalog, &[]);
        assert_eq!(matcher.match_names("", "Acme", "US", "US"), None);
        assert_eq!(matcher.match_names("   ", "Acme", "US", "US"), None);
    }

    #[test]
    fn legal_form_variants_match_highly() {
        let catalog = test_catalog();
        let matcher = CorporateNameMatcher::new(&catalog, &[]);
        let score = matcher
            .match_names("PayPal Holdings", "PayPal Holding", "US", "US")
            .expect("expected a score");
        assert!(score > 0.85, "expected high score, got {score}");
    }

    #[test]
    fn commutative_scores() {
        let catalog = test_catalog();
        let matcher = CorporateNameMatcher::new(&catalog, &[]);
        let forward = matcher.match_names("Johnson & Johnson", "Johnson and Jonson", "US", "US");
        let backward = matcher.match_names("Johnson and Jonson", "Johnson & Johnson", "US", "US");
        assert_eq!(forward, backward);
    }

    #[test]
    fn clearly_unrelated_names_yield_no_opinion() {
        let catalog = test_catalog();
        let matcher = CorporateNameMatcher::new(&catalog, &[]);
        assert_eq!(matcher.match_names("Acme Corp", "Totally Unrelated Holdings", "US", "US"), None);
    }

    #[test]
    fn differing_legal_forms_apply_mismatch_penalty() {
        let catalog = test_catalog();
        let matcher = CorporateNameMatcher::new(&catalog, &[]);
        let score = matcher.match_names("Siemens AG", "Siemens GmbH", "DE", "DE");
        assert!(score.is_some());
        assert!(score.unwrap() < 1.0);
    }

    #[test]
    fn missing_countries_default_to_de() {
        let catalog = test_catalog();
        let matcher = CorporateNameMatcher::new(&catalog, &[]);
        let with_default = matcher.match_names("Siemens AG", "Siemens AG", "", "");
        assert_eq!(with_default, Some(1.0));
    }
}
