//! Legal-form catalog, replacement rules, cleaning, and retrieval.
//!
//! `cleaner` is the cheap exact-match path used as a fallback; `retriever`
//! is the fuzzy, split-tracking path used when a specific legal-form
//! variant (and not just "some legal form or other") needs to be
//! identified or subtracted.

pub mod catalog;
pub mod cleaner;
pub mod replacement;
pub mod retriever;
pub mod split_tracker;

pub use catalog::{LegalFormCatalog, LegalFormEntry, LegalFormRecord};
pub use cleaner::{clean, clean_and_remove_legal_form};
pub use replacement::{load_rules, LegalFormReplacementRule};
pub use retriever::LegalFormRetriever;
pub use split_tracker::{SplitTracker, TokenOrigin};
