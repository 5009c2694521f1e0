//! # Legal-Form Cleaner
//!
//! ## Purpose
//! The cheap, catalog-driven half of normalization: strip a trailing
//! parenthesized qualifier, strip light punctuation, and iteratively remove
//! any catalog legal form that appears as a trailing whole word or as the
//! entire remaining string. This is deliberately simpler than the full
//! `retriever` pipeline (no fuzzy matching, no token splitting) and is the
//! fallback `clean()` used whenever the retriever doesn't find a specific
//! legal-form variant to subtract.

use crate::legal_forms::catalog::LegalFormCatalog;
use regex::Regex;
use std::sync::OnceLock;

fn trailing_paren_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\([^()]*\)\s*$").unwrap())
}

/// Remove a single trailing `(...)` group, along with the whitespace before it.
pub fn strip_parenthesized_tail(s: &str) -> String {
    trailing_paren_regex().replace(s, "").to_string()
}

/// Remove `,`, `;`, `:` characters.
pub fn strip_punctuation(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, ',' | ';' | ':')).collect()
}

/// `trim` -> `strip_parenthesized_tail` -> `strip_punctuation`.
pub fn clean(s: &str) -> String {
    let trimmed = s.trim();
    let no_paren = strip_parenthesized_tail(trimmed);
    strip_punctuation(no_paren.trim())
}

/// `clean`, then iteratively strip any catalog entry that appears as a
/// trailing whole word or as the entire string, case-insensitively, until no
/// entry can be stripped. Returns `""` if the entire remainder was a legal
/// form.
pub fn clean_and_remove_legal_form(s: &str, catalog: &LegalFormCatalog, country: &str) -> String {
    let mut current = clean(s);
    let entries = catalog.entries_for(country);

    loop {
        let upper = current.to_uppercase();
        if upper.is_empty() {
            break;
        }

        let mut stripped_any = false;
        for entry in &entries {
            if upper == entry.text {
                current.clear();
                stripped_any = true;
                break;
            }
            let suffix = format!(" {}", entry.text);
            if upper.ends_with(&suffix) {
                let cut = current.len() - suffix.len();
                current.truncate(cut);
                current = current.trim_end().to_string();
                stripped_any = true;
                break;
            }
        }

        if !stripped_any {
            break;
        }
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn empty_catalog() -> LegalFormCatalog {
        LegalFormCatalog::load(Path::new("/no/such.json"), Path::new("/no/such.txt")).unwrap()
    }

    #[test]
    fn strips_trailing_parenthesized_group() {
        assert_eq!(strip_parenthesized_tail("Acme Corp (formerly Acme Inc)"), "Acme Corp");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(strip_punctuation("Acme, Corp; Ltd:"), "Acme Corp Ltd");
    }

    #[test]
    fn clean_is_idempotent() {
        let once = clean("  Acme, Corp (old name)  ");
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn removes_trailing_legal_form() {
        let json = r#"[{"legal_form_id":"us.inc","short_name":"INC","country":"US"}]"#;
        let json_path = {
            use std::io::Write;
            let mut f = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
            f.write_all(json.as_bytes()).unwrap();
            f.into_temp_path()
        };
        let appendix = tempfile::Builder::new().suffix(".txt").tempfile().unwrap().into_temp_path();
        let catalog = LegalFormCatalog::load(&json_path, &appendix).unwrap();

        assert_eq!(clean_and_remove_legal_form("Acme Inc", &catalog, "US"), "Acme");
        assert_eq!(clean_and_remove_legal_form("INC", &catalog, "US"), "");
    }

    #[test]
    fn unknown_country_leaves_name_untouched() {
        let catalog = empty_catalog();
        assert_eq!(clean_and_remove_legal_form("Acme Inc", &catalog, "ZZ"), "Acme Inc");
    }
}
