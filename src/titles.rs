//! # Titles Catalog
//!
//! ## Purpose
//! Case-insensitive membership sets for nobility particles ("von", "van",
//! "de") and personal/professional titles ("Dr.", "Sir", "Lord"), loaded
//! from two flat line-delimited files. Used by the city matcher to strip a
//! leading honorific before comparing place names; the corporate-name
//! matcher has its own legal-form vocabulary and never consults this.

use crate::errors::{MatchError, Result};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct TitlesCatalog {
    nobility: HashSet<String>,
    titles: HashSet<String>,
}

fn load_lines(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "titles file not found, continuing with empty set");
        return Ok(HashSet::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| MatchError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_lowercase())
        .collect())
}

impl TitlesCatalog {
    pub fn load(nobility_path: &Path, titles_path: &Path) -> Result<Self> {
        Ok(Self {
            nobility: load_lines(nobility_path)?,
            titles: load_lines(titles_path)?,
        })
    }

    pub fn is_nobility_particle(&self, token: &str) -> bool {
        self.nobility.contains(&token.trim().to_lowercase())
    }

    pub fn is_title(&self, token: &str) -> bool {
        self.titles.contains(&token.trim().to_lowercase())
    }
}
