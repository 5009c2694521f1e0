//! # City Matcher
//!
//! ## Purpose
//! A reference collaborator, not the system's core concern: place names
//! share the same "few significant words, punctuation-light" shape as
//! company names, so `match_city` reuses the word comparator rather than
//! maintaining a second fuzzy-matching stack. Not tuned against a
//! dedicated place-name corpus.

use crate::text;
use crate::titles::TitlesCatalog;
use crate::word_match;
use std::collections::HashMap;
use std::path::Path;

/// `input_name,canonical` alias table plus the titles catalog used to
/// strip a leading honorific before comparison.
pub struct CityMatcher {
    aliases: HashMap<String, String>,
    titles: TitlesCatalog,
}

fn load_aliases(path: &Path) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            tracing::warn!(path = %path.display(), "city alias table not found, continuing without it");
            return map;
        }
    };
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("input_name,") {
            continue;
        }
        if let Some((input, canonical)) = trimmed.split_once(',') {
            let canonical = canonical.trim();
            if canonical.is_empty() {
                continue;
            }
            map.insert(input.trim().to_lowercase(), canonical.to_string());
        }
    }
    map
}

fn strip_leading_title<'a>(tokens: &'a [&'a str], titles: &TitlesCatalog) -> String {
    match tokens.split_first() {
        Some((first, rest)) if titles.is_title(first) || titles.is_nobility_particle(first) => {
            rest.join(" ")
        }
        _ => tokens.join(" "),
    }
}

impl CityMatcher {
    pub fn load(alias_path: &Path, nobility_path: &Path, titles_path: &Path) -> crate::errors::Result<Self> {
        Ok(Self {
            aliases: load_aliases(alias_path),
            titles: TitlesCatalog::load(nobility_path, titles_path)?,
        })
    }

    fn resolve(&self, place: &str) -> String {
        let key = place.trim().to_lowercase();
        self.aliases.get(&key).cloned().unwrap_or_else(|| place.trim().to_string())
    }

    /// `match_city(place1, place2) -> score | none`.
    pub fn match_city(&self, place1: &str, place2: &str) -> Option<f64> {
        let resolved1 = self.resolve(place1);
        let resolved2 = self.resolve(place2);

        let tokens1: Vec<&str> = resolved1.split_whitespace().collect();
        let tokens2: Vec<&str> = resolved2.split_whitespace().collect();
        if tokens1.is_empty() || tokens2.is_empty() {
            return None;
        }

        let stripped1 = strip_leading_title(&tokens1, &self.titles);
        let stripped2 = strip_leading_title(&tokens2, &self.titles);
        if stripped1.is_empty() || stripped2.is_empty() {
            return None;
        }

        if text::equal_diacritic_insensitive(&stripped1, &stripped2) {
            return Some(1.0);
        }

        let score = word_match::compare_by_words(&stripped1, &stripped2);
        if score > 0.0 {
            Some(score)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::TempPath {
        let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.into_temp_path()
    }

    #[test]
    fn alias_table_resolves_before_comparison() {
        let aliases = write_temp("input_name,canonical\nnyc,New York\nbig apple,New York\n");
        let nobility = write_temp("von\n");
        let titles = write_temp("dr.\n");
        let matcher = CityMatcher::load(&aliases, &nobility, &titles).unwrap();
        assert_eq!(matcher.match_city("NYC", "New York"), Some(1.0));
        assert_eq!(matcher.match_city("Big Apple", "nyc"), Some(1.0));
    }

    #[test]
    fn strips_leading_title_before_comparing() {
        let aliases = write_temp("input_name,canonical\n");
        let nobility = write_temp("von\n");
        let titles = write_temp("saint\n");
        let matcher = CityMatcher::load(&aliases, &nobility, &titles).unwrap();
        assert_eq!(matcher.match_city("Saint Petersburg", "Petersburg"), Some(1.0));
    }

    #[test]
    fn unrelated_places_yield_no_opinion() {
        let aliases = write_temp("input_name,canonical\n");
        let nobility = write_temp("");
        let titles = write_temp("");
        let matcher = CityMatcher::load(&aliases, &nobility, &titles).unwrap();
        assert_eq!(matcher.match_city("Berlin", "Tokyo"), None);
    }

    #[test]
    fn missing_alias_file_leaves_names_unchanged() {
        let nobility = write_temp("");
        let titles = write_temp("");
        let matcher = CityMatcher::load(Path::new("/no/such.txt"), &nobility, &titles).unwrap();
        assert_eq!(matcher.match_city("Paris", "Paris"), Some(1.0));
    }
}
