//! # Configuration Module
//!
//! ## Purpose
//! Describes where the catalog resources live on disk and the handful of
//! tunables the matching and duplicate-finding pipeline exposes. This is the
//! only place in the crate that talks about file paths; every other module
//! operates on already-loaded, in-memory catalogs.
//!
//! ## Input/Output Specification
//! - **Input**: a TOML configuration file, or `MatcherConfig::default()`
//! - **Output**: a validated `MatcherConfig`
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Explicit overrides via the builder-style `with_*` methods.
//! 2. A TOML configuration file (`MatcherConfig::from_file`).
//! 3. Default values (`MatcherConfig::default`), pointing at `./resources/`.
//!
//! ## Usage
//! ```rust
//! use corpname_match::config::MatcherConfig;
//!
//! let config = MatcherConfig::default();
//! assert_eq!(config.duplicates.score_threshold, 0.85);
//! ```

use crate::errors::{MatchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the corporate-name matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Paths to the resource files the catalogs are built from.
    pub resources: ResourceConfig,
    /// Tunables for the duplicate-finding engine.
    pub duplicates: DuplicatesConfig,
    /// Logging verbosity hint for the embedding application (the crate never
    /// installs a subscriber itself).
    pub logging: LoggingConfig,
}

/// Paths to the catalog resource files described in the external interfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// `legal_forms.json`: structured short/long legal-form names by country.
    pub legal_forms_path: PathBuf,
    /// `legal_form_replacements.csv`: multiword replacement rules.
    pub legal_form_replacements_path: PathBuf,
    /// `addition_legal_forms.txt`: appendix of extra legal-form suffixes.
    pub addition_legal_forms_path: PathBuf,
    /// `nobility-titles.txt`: nobility particles (von, zu, de, ...).
    pub nobility_titles_path: PathBuf,
    /// `titles.txt`: honorific titles.
    pub titles_path: PathBuf,
    /// `cityMappings.txt`: place-name alias table for the city matcher.
    pub city_mappings_path: PathBuf,
}

/// Tunables for `duplicates::find_duplicates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicatesConfig {
    /// Minimum score (exclusive) for a pair to be emitted.
    pub score_threshold: f64,
    /// Maximum length of the blocking key (first letters of tokens).
    pub block_key_max_len: usize,
    /// Worker thread count for the rayon pool used by `find_duplicates`.
    /// `None` lets rayon pick (defaults to the number of logical CPUs).
    pub worker_threads: Option<usize>,
}

/// Logging verbosity hint. Purely informational: the crate emits `tracing`
/// events regardless, and it is the embedding application's job to install
/// and configure a subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl MatcherConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(?path, "configuration file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| MatchError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: MatcherConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.duplicates.score_threshold) {
            return Err(MatchError::Config {
                message: format!(
                    "duplicates.score_threshold must be in [0, 1], got {}",
                    self.duplicates.score_threshold
                ),
            });
        }
        if self.duplicates.block_key_max_len == 0 {
            return Err(MatchError::Config {
                message: "duplicates.block_key_max_len must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Effective rayon worker count: explicit override, else logical CPU count.
    pub fn effective_worker_threads(&self) -> usize {
        self.duplicates.worker_threads.unwrap_or_else(num_cpus::get)
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            resources: ResourceConfig {
                legal_forms_path: PathBuf::from("./resources/legal_forms.json"),
                legal_form_replacements_path: PathBuf::from(
                    "./resources/legal_form_replacements.csv",
                ),
                addition_legal_forms_path: PathBuf::from("./resources/addition_legal_forms.txt"),
                nobility_titles_path: PathBuf::from("./resources/nobility-titles.txt"),
                titles_path: PathBuf::from("./resources/titles.txt"),
                city_mappings_path: PathBuf::from("./resources/cityMappings.txt"),
            },
            duplicates: DuplicatesConfig {
                score_threshold: 0.85,
                block_key_max_len: 4,
                worker_threads: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}
