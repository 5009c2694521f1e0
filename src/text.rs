//! # Text Utilities Module
//!
//! ## Purpose
//! Diacritic folding, case folding, and alphanumeric filtering shared by
//! every higher-level module. Three diacritic policies exist because the
//! catalog and retriever need to be insensitive to *which* convention a
//! caller used to romanize a name (a raw NFD strip, an "extended" mapping
//! that spells out ligatures like ß→SS, and a "simple" mapping that just
//! drops the diacritic).
//!
//! ## Key Features
//! - `equal_diacritic_insensitive`: true if any of the nine policy
//!   cross-products agree.
//! - `normalize_stripped` / `normalize_preserve_specials`: the two shapes
//!   every downstream comparison needs (collapsed to letters+digits, or with
//!   token-shaping punctuation intact).

use unicode_normalization::UnicodeNormalization;

/// Which diacritic-folding convention to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiacriticPolicy {
    /// Pure Unicode decomposition (NFD) with combining marks dropped.
    Raw,
    /// Spells out certain letters: Ä→AE, Ø→OE, ß→SS.
    Extended,
    /// Drops to the nearest plain letter: Ä→A, Ø→O, Ł→L, Đ→D.
    Simple,
}

const ALL_POLICIES: [DiacriticPolicy; 3] = [
    DiacriticPolicy::Raw,
    DiacriticPolicy::Extended,
    DiacriticPolicy::Simple,
];

fn extended_map(c: char) -> Option<&'static str> {
    match c {
        'Ä' | 'ä' => Some("AE"),
        'Ö' | 'ö' => Some("OE"),
        'Ü' | 'ü' => Some("UE"),
        'Ø' | 'ø' => Some("OE"),
        'ß' => Some("SS"),
        'Æ' | 'æ' => Some("AE"),
        'Œ' | 'œ' => Some("OE"),
        _ => None,
    }
}

fn simple_map(c: char) -> Option<char> {
    match c {
        'Ä' | 'ä' => Some('A'),
        'Ö' | 'ö' => Some('O'),
        'Ü' | 'ü' => Some('U'),
        'Ø' | 'ø' => Some('O'),
        'ß' => Some('S'),
        'Ł' | 'ł' => Some('L'),
        'Đ' | 'đ' => Some('D'),
        'Æ' | 'æ' => Some('A'),
        'Œ' | 'œ' => Some('O'),
        _ => None,
    }
}

/// Apply one diacritic policy, then NFD-decompose and drop combining marks.
fn fold_diacritics(s: &str, policy: DiacriticPolicy) -> String {
    let mapped: String = match policy {
        DiacriticPolicy::Raw => s.to_string(),
        DiacriticPolicy::Extended => s
            .chars()
            .map(|c| extended_map(c).map(|r| r.to_string()).unwrap_or_else(|| c.to_string()))
            .collect(),
        DiacriticPolicy::Simple => s
            .chars()
            .map(|c| simple_map(c).unwrap_or(c))
            .collect(),
    };

    mapped
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

/// Case-fold to upper, fold diacritics under `policy`, and keep only
/// `{A-Z, 0-9}` (spaces and everything else are dropped).
pub fn normalize_stripped(s: &str, policy: DiacriticPolicy) -> String {
    fold_diacritics(&s.to_uppercase(), policy)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Like `normalize_stripped`, but spaces and other non-alphanumeric
/// characters are retained verbatim (used where token boundaries matter).
pub fn normalize_preserve_specials(s: &str, policy: DiacriticPolicy) -> String {
    fold_diacritics(&s.to_uppercase(), policy)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { c })
        .collect()
}

/// True iff `a` and `b` are equal after casefolding and diacritic stripping,
/// under *any* combination of the three diacritic policies (one per side).
pub fn equal_diacritic_insensitive(a: &str, b: &str) -> bool {
    let a_variants: Vec<String> = ALL_POLICIES.iter().map(|p| normalize_stripped(a, *p)).collect();
    let b_variants: Vec<String> = ALL_POLICIES.iter().map(|p| normalize_stripped(b, *p)).collect();

    a_variants
        .iter()
        .any(|av| b_variants.iter().any(|bv| av == bv))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_to_alnum_upper() {
        assert_eq!(normalize_stripped("Acme, Inc.", DiacriticPolicy::Raw), "ACMEINC");
    }

    #[test]
    fn extended_policy_spells_out_ligatures() {
        assert_eq!(normalize_stripped("Straße", DiacriticPolicy::Extended), "STRASSE");
        assert_eq!(normalize_stripped("Käse Øyen", DiacriticPolicy::Extended), "KAESEOEYEN");
    }

    #[test]
    fn simple_policy_drops_diacritics() {
        assert_eq!(normalize_stripped("Straße", DiacriticPolicy::Simple), "STRASE");
        assert_eq!(normalize_stripped("Łukasz", DiacriticPolicy::Simple), "LUKASZ");
    }

    #[test]
    fn preserve_specials_keeps_spaces() {
        assert_eq!(
            normalize_preserve_specials("Siemens AG", DiacriticPolicy::Raw),
            "SIEMENS AG"
        );
    }

    #[test]
    fn equal_diacritic_insensitive_cross_policy() {
        assert!(equal_diacritic_insensitive("Straße GmbH", "STRASSE GMBH"));
        assert!(equal_diacritic_insensitive("Müller", "Muller"));
        assert!(!equal_diacritic_insensitive("Müller", "Schmidt"));
    }

    #[test]
    fn empty_string_normalizes_to_empty() {
        assert_eq!(normalize_stripped("", DiacriticPolicy::Raw), "");
        assert!(equal_diacritic_insensitive("", ""));
    }
}
