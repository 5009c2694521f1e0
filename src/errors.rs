//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the corporate-name matcher, covering the two
//! places errors can legitimately occur: loading catalog resources at
//! initialization, and malformed configuration.
//!
//! ## Key Features
//! - A single `thiserror`-based error enum for all fatal, load-time failures.
//! - Scoring-path "failure" is never represented here: an undecidable pair
//!   returns `None`, not an `Err`. See `matcher::CorporateNameMatcher::match_names`.
//!
//! ## Usage
//! ```rust
//! use corpname_match::errors::{Result, MatchError};
//!
//! fn load_operation() -> Result<()> {
//!     Err(MatchError::CatalogLoad {
//!         source: "legal_forms.json".to_string(),
//!         details: "unexpected EOF".to_string(),
//!     })
//! }
//! ```

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, MatchError>;

/// Error taxonomy for the corporate-name matcher.
///
/// Only load-time and configuration failures are represented as errors.
/// Everything on the scoring path is absence (`Option::None`), never an
/// exception.
#[derive(Debug, Error)]
pub enum MatchError {
    /// A required resource file could not be read at all.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A required resource file was read but could not be parsed into a
    /// usable catalog (e.g. `legal_forms.json` is not valid JSON).
    #[error("failed to load catalog from {source}: {details}")]
    CatalogLoad { source: String, details: String },

    /// Configuration file present but malformed.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Internal invariant violated; should not occur in correct builds.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl MatchError {
    /// Category tag, useful for structured logging / metrics on the caller's side.
    pub fn category(&self) -> &'static str {
        match self {
            MatchError::Io { .. } => "io",
            MatchError::CatalogLoad { .. } => "catalog",
            MatchError::Config { .. } => "configuration",
            MatchError::Internal { .. } => "internal",
        }
    }
}

impl From<serde_json::Error> for MatchError {
    fn from(err: serde_json::Error) -> Self {
        MatchError::CatalogLoad {
            source: "json".to_string(),
            details: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MatchError {
    fn from(err: toml::de::Error) -> Self {
        MatchError::Config {
            message: err.to_string(),
        }
    }
}
