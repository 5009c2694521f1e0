//! # Legal-Form Replacement Rules
//!
//! ## Purpose
//! Loads `legal_form_replacements.csv`, a flat list of `search_pattern,
//! replacement` lines, into sorted, tokenized rules the retriever's
//! normalization pass applies right-to-left against an input name's tokens.

use crate::errors::{MatchError, Result};
use crate::text::{normalize_stripped, DiacriticPolicy};
use std::path::Path;

/// A single `(multiword search pattern, canonical replacement)` rule.
#[derive(Debug, Clone)]
pub struct LegalFormReplacementRule {
    /// Search pattern tokens: diacritic-stripped, lower-cased.
    pub pattern_tokens: Vec<String>,
    /// Canonical replacement token (the rule's right-hand side).
    pub replacement: String,
}

impl LegalFormReplacementRule {
    pub fn word_count(&self) -> usize {
        self.pattern_tokens.len()
    }

    fn total_len(&self) -> usize {
        self.pattern_tokens.iter().map(|t| t.len()).sum()
    }
}

/// Load replacement rules from a CSV file of `search_pattern,replacement`
/// lines. Malformed individual lines are skipped with a warning; a missing
/// file yields an empty rule set.
pub fn load_rules(path: &Path) -> Result<Vec<LegalFormReplacementRule>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "legal form replacement rules not found, continuing without them");
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|e| MatchError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut rules = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed.split_once(',') {
            Some((pattern, replacement)) => {
                let pattern_tokens: Vec<String> = pattern
                    .split_whitespace()
                    .map(|t| normalize_stripped(t, DiacriticPolicy::Raw).to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect();
                let replacement = normalize_stripped(replacement.trim(), DiacriticPolicy::Raw)
                    .to_lowercase();
                if pattern_tokens.is_empty() || replacement.is_empty() {
                    tracing::warn!(line = line_no + 1, "skipping empty replacement rule");
                    continue;
                }
                rules.push(LegalFormReplacementRule {
                    pattern_tokens,
                    replacement,
                });
            }
            None => {
                tracing::warn!(line = line_no + 1, content = trimmed, "skipping malformed replacement rule line");
            }
        }
    }

    rules.sort_by(|a, b| {
        b.word_count()
            .cmp(&a.word_count())
            .then_with(|| b.total_len().cmp(&a.total_len()))
    });

    Ok(rules)
}
