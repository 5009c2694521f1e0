//! # Legal-Form Catalog
//!
//! ## Purpose
//! Loads the recognized legal-form vocabulary (GmbH, AG, Ltd, Inc, ...) from
//! two sources: a structured `legal_forms.json` (short/long names tagged by
//! country) and a flat appendix list of extra suffixes applying to every
//! country. Entries are deduplicated by upper-case equality and grouped by
//! country for the retriever's candidate search.

use crate::errors::{MatchError, Result};
use crate::text::{normalize_stripped, DiacriticPolicy};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One entry from `legal_forms.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct LegalFormRecord {
    pub legal_form_id: String,
    pub short_name: String,
    #[serde(default)]
    pub long_name: Option<String>,
    pub country: String,
}

/// A single recognized legal-form string, upper-cased, scoped to a country.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LegalFormEntry {
    pub text: String,
    pub country: String,
}

/// The full, deduplicated legal-form vocabulary, grouped by country and
/// sorted (per country) by cleaned length descending so the retriever tries
/// the most specific match first.
#[derive(Debug, Clone, Default)]
pub struct LegalFormCatalog {
    by_country: HashMap<String, Vec<LegalFormEntry>>,
}

impl LegalFormCatalog {
    /// Load from a structured JSON file and an appendix text file. Either
    /// path may be missing: a missing file reduces coverage with a warning
    /// rather than failing the whole load (§7, Catalog-missing). A file that
    /// exists but fails to parse at the top level is a fatal `CatalogLoad`
    /// error; individual malformed records inside it are skipped.
    pub fn load(legal_forms_json: &Path, addition_legal_forms_txt: &Path) -> Result<Self> {
        let mut seen: HashMap<String, Vec<LegalFormEntry>> = HashMap::new();

        if legal_forms_json.exists() {
            let content = std::fs::read_to_string(legal_forms_json).map_err(|e| MatchError::Io {
                path: legal_forms_json.display().to_string(),
                source: e,
            })?;
            let records: Vec<serde_json::Value> = serde_json::from_str(&content)
                .map_err(|e| MatchError::CatalogLoad {
                    source: legal_forms_json.display().to_string(),
                    details: e.to_string(),
                })?;

            for value in records {
                match serde_json::from_value::<LegalFormRecord>(value) {
                    Ok(record) => {
                        insert_unique(&mut seen, &record.country, &record.short_name);
                        if let Some(long) = &record.long_name {
                            insert_unique(&mut seen, &record.country, long);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping malformed legal-form record");
                    }
                }
            }
        } else {
            tracing::warn!(path = %legal_forms_json.display(), "legal forms catalog not found, continuing with empty base catalog");
        }

        if addition_legal_forms_txt.exists() {
            let content = std::fs::read_to_string(addition_legal_forms_txt).map_err(|e| {
                MatchError::Io {
                    path: addition_legal_forms_txt.display().to_string(),
                    source: e,
                }
            })?;
            for line in content.lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                // Appendix entries apply to every country we've seen, plus a
                // catch-all bucket used when no country is specified.
                insert_unique(&mut seen, "*", trimmed);
            }
        } else {
            tracing::warn!(path = %addition_legal_forms_txt.display(), "appendix legal forms file not found, continuing without it");
        }

        for entries in seen.values_mut() {
            entries.sort_by(|a, b| b.text.len().cmp(&a.text.len()));
        }

        Ok(Self { by_country: seen })
    }

    /// All recognized forms for `country`, plus the catch-all appendix
    /// entries, sorted longest-first.
    pub fn entries_for(&self, country: &str) -> Vec<&LegalFormEntry> {
        let country_upper = country.to_uppercase();
        let mut out: Vec<&LegalFormEntry> = self
            .by_country
            .get(&country_upper)
            .map(|v| v.iter().collect())
            .unwrap_or_default();
        if let Some(catch_all) = self.by_country.get("*") {
            out.extend(catch_all.iter());
        }
        out.sort_by(|a, b| b.text.len().cmp(&a.text.len()));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.by_country.values().all(|v| v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.by_country.values().map(|v| v.len()).sum()
    }
}

fn insert_unique(map: &mut HashMap<String, Vec<LegalFormEntry>>, country: &str, text: &str) {
    let country_upper = country.to_uppercase();
    let normalized = normalize_stripped(text, DiacriticPolicy::Raw);
    if normalized.is_empty() {
        return;
    }
    let bucket = map.entry(country_upper.clone()).or_default();
    if bucket.iter().any(|e| e.text == text.to_uppercase()) {
        return;
    }
    bucket.push(LegalFormEntry {
        text: text.to_uppercase(),
        country: country_upper,
    });
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

    #[test]
    fn loads_and_dedups_json_entries() {
        let json = r#"[
            {"legal_form_id": "de.gmbh", "short_name": "GmbH", "long_name": "Gesellschaft mit beschraenkter Haftung", "country": "DE"},
            {"legal_form_id": "de.gmbh2", "short_name": "GMBH", "country": "DE"},
            {"legal_form_id": "us.inc", "short_name": "Inc", "country": "US"}
        ]"#;
        let json_path = write_temp(json, ".json");
        let appendix_path = write_temp("", ".txt");

        let catalog = LegalFormCatalog::load(&json_path, &appendix_path).unwrap();
        let de_entries: Vec<&str> = catalog
            .entries_for("DE")
            .iter()
            .map(|e| e.text.as_str())
            .collect();
        assert!(de_entries.contains(&"GMBH"));
        assert_eq!(de_entries.iter().filter(|t| **t == "GMBH").count(), 1);
        assert!(catalog.entries_for("US").iter().any(|e| e.text == "INC"));
    }

    #[test]
    fn missing_files_produce_empty_catalog_not_error() {
        let catalog =
            LegalFormCatalog::load(Path::new("/no/such/file.json"), Path::new("/no/such/file.txt"))
                .unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.entries_for("DE").is_empty());
    }

    #[test]
    fn appendix_entries_apply_to_every_country() {
        let json_path = write_temp("[]", ".json");
        let appendix_path = write_temp("Holding\nHoldings\n\n", ".txt");
        let catalog = LegalFormCatalog::load(&json_path, &appendix_path).unwrap();
        assert!(catalog.entries_for("US").iter().any(|e| e.text == "HOLDING"));
        assert!(catalog.entries_for("ANYWHERE").iter().any(|e| e.text == "HOLDINGS"));
    }

    #[test]
    fn entries_sorted_longest_first() {
        let json_path = write_temp("[]", ".json");
        let appendix_path = write_temp("AG\nAktiengesellschaft\n", ".txt");
        let catalog = LegalFormCatalog::load(&json_path, &appendix_path).unwrap();
        let entries = catalog.entries_for("DE");
        assert_eq!(entries[0].text, "AKTIENGESELLSCHAFT");
    }
}
