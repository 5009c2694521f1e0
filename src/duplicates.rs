//! # Duplicate Finder
//!
//! ## Purpose
//! Discovers likely-duplicate pairs within a batch of company names:
//! block by a cheap initials-derived key, compare only within a block, and
//! confirm candidates with the full `CorporateNameMatcher` score. Blocks
//! are independent and processed with `rayon`'s data-parallel fold/reduce,
//! so the default `find_duplicates` entry point never needs an explicit
//! thread pool or lock.

use crate::legal_forms::{LegalFormCatalog, LegalFormReplacementRule};
use crate::matcher::CorporateNameMatcher;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

const STOPWORDS: [&str; 4] = ["AND", "THE", "OF", "&"];
const DEFAULT_SCORE_THRESHOLD: f64 = 0.85;

/// One discovered duplicate pair: the two original input strings and the
/// score that confirmed them. Score is always in `(threshold, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub name1: String,
    pub name2: String,
    pub score: f64,
}

fn normalize_for_blocking(name: &str) -> Vec<String> {
    let cleaned = crate::legal_forms::cleaner::clean(name);
    let upper = crate::text::normalize_preserve_specials(&cleaned, crate::text::DiacriticPolicy::Raw);
    upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

fn block_key(tokens: &[String], max_len: usize) -> String {
    let key: String = tokens
        .iter()
        .filter_map(|t| t.chars().next())
        .collect();
    key.chars().take(max_len).collect()
}

fn words_overlap(a: &[String], b: &[String]) -> bool {
    a.iter().any(|wa| {
        b.iter().any(|wb| {
            wa.eq_ignore_ascii_case(wb) || wa.starts_with(wb.as_str()) || wb.starts_with(wa.as_str())
        })
    })
}

/// A concurrent, append-only sink of discovered duplicate pairs, backed by
/// a `DashSet`. Alternative to collecting a flat `Vec` when a caller wants
/// to observe matches as they're produced rather than after the whole
/// batch completes. Deduplicates identical `(name1, name2, score)` triples
/// emitted from different blocks (shouldn't happen under well-formed block
/// keys, but costs nothing to guard against).
#[derive(Debug, Default)]
pub struct ConcurrentSink {
    results: dashmap::DashMap<(String, String, u64), ()>,
}

impl ConcurrentSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, name1: String, name2: String, score: f64) {
        let key = (name1, name2, score.to_bits());
        self.results.insert(key, ());
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<MatchResult> {
        self.results
            .into_iter()
            .map(|((name1, name2, score_bits), _)| MatchResult {
                name1,
                name2,
                score: f64::from_bits(score_bits),
            })
            .collect()
    }
}

/// Groups input indices by block key, assuming `names` has already been
/// normalized into tokens via `normalize_for_blocking`.
fn group_by_block(token_lists: &[Vec<String>], max_len: usize) -> HashMap<String, Vec<usize>> {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, tokens) in token_lists.iter().enumerate() {
        let key = block_key(tokens, max_len);
        groups.entry(key).or_default().push(i);
    }
    groups
}

fn score_block(
    block: &[usize],
    names: &[String],
    token_lists: &[Vec<String>],
    matcher: &CorporateNameMatcher,
    threshold: f64,
) -> Vec<MatchResult> {
    let mut out = Vec::new();
    for (bi, &i) in block.iter().enumerate() {
        for &j in &block[bi + 1..] {
            if !words_overlap(&token_lists[i], &token_lists[j]) {
                continue;
            }
            if let Some(score) = matcher.match_names(&names[i], &names[j], "", "") {
                if score > threshold {
                    out.push(MatchResult {
                        name1: names[i].clone(),
                        name2: names[j].clone(),
                        score,
                    });
                }
            }
        }
    }
    out
}

/// Default entry point: normalize, block, and score every block in
/// parallel via `rayon`, folding each block's matches and reducing them
/// into one flat `Vec`. Duplicate-free (no self-pairs, no ordered-reversed
/// duplicates) by construction, since each block only ever compares `i <
/// j` within itself and a name belongs to exactly one block.
pub fn find_duplicates(
    names: &[String],
    catalog: &LegalFormCatalog,
    rules: &[LegalFormReplacementRule],
) -> Vec<MatchResult> {
    find_duplicates_with(names, catalog, rules, DEFAULT_SCORE_THRESHOLD, 4)
}

pub fn find_duplicates_with(
    names: &[String],
    catalog: &LegalFormCatalog,
    rules: &[LegalFormReplacementRule],
    score_threshold: f64,
    block_key_max_len: usize,
) -> Vec<MatchResult> {
    let token_lists: Vec<Vec<String>> = names.iter().map(|n| normalize_for_blocking(n)).collect();
    let groups = group_by_block(&token_lists, block_key_max_len);
    let matcher = CorporateNameMatcher::new(catalog, rules);

    groups
        .par_iter()
        .map(|(_, block)| score_block(block, names, &token_lists, &matcher, score_threshold))
        .reduce(Vec::new, |mut acc, mut next| {
            acc.append(&mut next);
            acc
        })
}

/// Same traversal as `find_duplicates`, but pushes matches into a shared
/// `ConcurrentSink` instead of collecting a `Vec`, for callers who want to
/// observe results incrementally.
pub fn find_duplicates_into_sink(
    names: &[String],
    catalog: &LegalFormCatalog,
    rules: &[LegalFormReplacementRule],
    sink: &ConcurrentSink,
    score_threshold: f64,
    block_key_max_len: usize,
) {
    let token_lists: Vec<Vec<String>> = names.iter().map(|n| normalize_for_blocking(n)).collect();
    let groups = group_by_block(&token_lists, block_key_max_len);
    let matcher = CorporateNameMatcher::new(catalog, rules);

    groups.par_iter().for_each(|(_, block)| {
        for result in score_block(block, names, &token_lists, &matcher, score_threshold) {
            sink.push(result.name1, result.name2, result.score);
        }
    });
}

#[allow(dead_code)]
fn assert_no_self_or_reverse_duplicates(results: &[MatchResult]) -> bool {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    for r in results {
        if r.name1 == r.name2 {
            return false;
        }
        if seen.contains(&(r.name2.clone(), r.name1.clone())) {
            return false;
        }
        seen.insert((r.name1.clone(), r.name2.clone()));
    }
    true
}
