//! # Corporate Name Matcher
//!
//! ## Overview
//! A fuzzy matching and duplicate-pair detection library for corporate
//! legal-entity names: strip and reason about legal-form suffixes
//! (GmbH, Inc, Ltd, Holdings, ...), compare names word-by-word with
//! abbreviation and prefix awareness, and discover likely-duplicate pairs
//! across a batch of names using a blocking strategy that keeps the naive
//! `O(n^2)` comparison tractable at scale.
//!
//! ## Architecture
//! - `text`: diacritic folding and casefolding primitives shared everywhere.
//! - `legal_forms`: the catalog, replacement rules, cheap cleaner, and the
//!   fuzzy, split-tracking retriever.
//! - `word_match`: multi-pass word-list assignment and the word-by-word
//!   name comparator.
//! - `matcher`: the top-level pairwise `CorporateNameMatcher`.
//! - `duplicates`: blocking-based batch duplicate discovery, sequential or
//!   `rayon`-parallel, with an optional `DashMap`-backed concurrent sink.
//! - `titles`, `city`: the nobility/title vocabulary and the place-name
//!   matcher that reuses the word comparator.
//! - `config`: resource paths and tunables, loaded from TOML.
//! - `errors`: the load-time error taxonomy.
//!
//! ## Usage
//! ```rust,no_run
//! use corpname_match::{config::MatcherConfig, Engine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MatcherConfig::default();
//!     let engine = Engine::load(&config)?;
//!     let score = engine.match_corporate_names("Siemens AG", "Siemens GmbH", "DE", "DE");
//!     println!("{:?}", score);
//!     Ok(())
//! }
//! ```

pub mod city;
pub mod config;
pub mod duplicates;
pub mod errors;
pub mod legal_forms;
pub mod matcher;
pub mod text;
pub mod titles;
pub mod word_match;

pub use config::MatcherConfig;
pub use duplicates::MatchResult;
pub use errors::{MatchError, Result};

use city::CityMatcher;
use legal_forms::{LegalFormCatalog, LegalFormReplacementRule};
use matcher::CorporateNameMatcher;

/// The loaded, read-only catalog state: legal-form vocabulary and
/// replacement rules, plus the city matcher's alias/title tables. Load
/// once per process (catalog parsing is the only I/O on the whole
/// scoring path) and share behind a reference; every scoring call borrows
/// from it without further I/O or locking.
pub struct Engine {
    catalog: LegalFormCatalog,
    rules: Vec<LegalFormReplacementRule>,
    city_matcher: CityMatcher,
    config: MatcherConfig,
}

impl Engine {
    /// Load every resource named in `config.resources`. Missing files
    /// reduce coverage with a warning rather than failing outright;
    /// unparseable top-level files (`legal_forms.json` not valid JSON)
    /// are fatal.
    pub fn load(config: &MatcherConfig) -> Result<Self> {
        let catalog = LegalFormCatalog::load(
            &config.resources.legal_forms_path,
            &config.resources.addition_legal_forms_path,
        )?;
        let rules = legal_forms::load_rules(&config.resources.legal_form_replacements_path)?;
        let city_matcher = CityMatcher::load(
            &config.resources.city_mappings_path,
            &config.resources.nobility_titles_path,
            &config.resources.titles_path,
        )?;

        Ok(Self {
            catalog,
            rules,
            city_matcher,
            config: config.clone(),
        })
    }

    fn matcher(&self) -> CorporateNameMatcher<'_> {
        CorporateNameMatcher::new(&self.catalog, &self.rules)
    }

    /// `match_corporate_names(name1, name2, country1="DE", country2="DE") -> f64 | none`.
    pub fn match_corporate_names(
        &self,
        name1: &str,
        name2: &str,
        country1: &str,
        country2: &str,
    ) -> Option<f64> {
        self.matcher().match_names(name1, name2, country1, country2)
    }

    /// `retrieve_legal_form(name, country_code) -> string | none`.
    pub fn retrieve_legal_form(&self, name: &str, country_code: &str) -> Option<String> {
        legal_forms::LegalFormRetriever::new(&self.catalog, &self.rules)
            .retrieve_legal_form(name, country_code)
    }

    /// `company_name_without_legal_form(name, country_code) -> string`.
    pub fn company_name_without_legal_form(&self, name: &str, country_code: &str) -> String {
        legal_forms::LegalFormRetriever::new(&self.catalog, &self.rules)
            .company_name_without_legal_form(name, country_code)
    }

    /// `clean_company_name_and_remove_legal_form(name) -> string`, using the
    /// cheap exact-match cleaner rather than the fuzzy retriever.
    pub fn clean_company_name_and_remove_legal_form(&self, name: &str, country_code: &str) -> String {
        legal_forms::clean_and_remove_legal_form(name, &self.catalog, country_code)
    }

    /// `match_city(place1, place2) -> f64 | none`.
    pub fn match_city(&self, place1: &str, place2: &str) -> Option<f64> {
        self.city_matcher.match_city(place1, place2)
    }

    /// `find_duplicates(names) -> list<{name1, name2, score}>`, parallelized
    /// over independent blocks via `rayon`.
    pub fn find_duplicates(&self, names: &[String]) -> Vec<MatchResult> {
        duplicates::find_duplicates_with(
            names,
            &self.catalog,
            &self.rules,
            self.config.duplicates.score_threshold,
            self.config.duplicates.block_key_max_len,
        )
    }

    /// Same traversal as `find_duplicates`, but streamed into a shared
    /// `duplicates::ConcurrentSink` instead of collected into a `Vec`.
    pub fn find_duplicates_into_sink(&self, names: &[String], sink: &duplicates::ConcurrentSink) {
        duplicates::find_duplicates_into_sink(
            names,
            &self.catalog,
            &self.rules,
            sink,
            self.config.duplicates.score_threshold,
            self.config.duplicates.block_key_max_len,
        )
    }
}

/// `clean_company_name(name) -> string`. Static, catalog-free: trims,
/// strips a trailing parenthesized qualifier, and removes light
/// punctuation. Exposed as a free function since it needs no loaded state.
pub fn clean_company_name(name: &str) -> String {
    legal_forms::clean(name)
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

    fn test_engine() -> Engine {
        let json = r#"[
            {"legal_form_id":"de.gmbh","short_name":"GmbH","country":"DE"},
            {"legal_form_id":"de.ag","short_name":"AG","country":"DE"},
            {"legal_form_id":"us.inc","short_name":"Inc","country":"US"},
            {"legal_form_id":"us.holdings","short_name":"Holdings","country":"US"},
            {"legal_form_id":"us.holding","short_name":"Holding","country":"US"}
        ]"#;
        let legal_forms_path = write_temp(json, ".json");
        let addition_path = write_temp("", ".txt");
        let replacements_path = write_temp("", ".csv");
        let nobility_path = write_temp("von\n", ".txt");
        let titles_path = write_temp("dr.\n", ".txt");
        let city_mappings_path = write_temp("input_name,canonical\n", ".txt");

        let config = MatcherConfig {
            resources: config::ResourceConfig {
                legal_forms_path: legal_forms_path.to_path_buf(),
                legal_form_replacements_path: replacements_path.to_path_buf(),
                addition_legal_forms_path: addition_path.to_path_buf(),
                nobility_titles_path: nobility_path.to_path_buf(),
                titles_path: titles_path.to_path_buf(),
                city_mappings_path: city_mappings_path.to_path_buf(),
            },
            ..MatcherConfig::default()
        };

        // Keep the tempfiles alive for the engine's lifetime by leaking
        // their paths into the config above; the files themselves are
        // dropped (and deleted) at the end of this function otherwise.
        std::mem::forget((
            legal_forms_path,
            addition_path,
            replacements_path,
            nobility_path,
            titles_path,
            city_mappings_path,
        ));

        Engine::load(&config).unwrap()
    }

    #[test]
    fn engine_matches_corporate_names_end_to_end() {
        let engine = test_engine();
        let score = engine
            .match_corporate_names("PayPal Holdings", "PayPal Holding", "US", "US")
            .expect("expected a score");
        assert!(score > 0.85);
    }

    #[test]
    fn engine_retrieves_and_removes_legal_forms() {
        let engine = test_engine();
        assert_eq!(engine.retrieve_legal_form("Siemens AG", "DE"), Some("AG".to_string()));
        assert_eq!(engine.company_name_without_legal_form("Siemens AG", "DE"), "Siemens");
    }

    #[test]
    fn engine_finds_duplicates_in_a_batch() {
        let engine = test_engine();
        let names = vec![
            "PayPal Holdings".to_string(),
            "PayPal Holding".to_string(),
            "Completely Unrelated Corp".to_string(),
        ];
        let results = engine.find_duplicates(&names);
        assert!(!results.is_empty());
    }

    #[test]
    fn clean_company_name_strips_punctuation_without_a_loaded_engine() {
        assert_eq!(clean_company_name("Acme, Corp (old name)"), "Acme Corp");
    }

    #[test]
    fn engine_matches_cities() {
        let engine = test_engine();
        assert_eq!(engine.match_city("Berlin", "Berlin"), Some(1.0));
    }
}
