// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fuzzy matching of extracted field values against known corpus values.
//!
//! The scorer is a weighted composite of whole-string, token-sort, token-set,
//! and windowed partial similarity over case- and punctuation-normalized
//! input, scaled to whole numbers in 0..=100. The acceptance threshold is
//! strict by default (98): it tolerates case, punctuation, and token-order
//! noise but rejects loose semantic similarity, so an accepted match is safe
//! to use as a hard retrieval constraint.

use std::collections::BTreeSet;

use tracing::debug;

use addrag_core::types::MatchResult;

/// Scale applied to token-sort and token-set scores so a reordered match
/// never outranks a verbatim one.
const TOKEN_SCALE: f64 = 0.95;

/// Scale applied to windowed partial scores for length-mismatched pairs.
const PARTIAL_SCALE: f64 = 0.9;

/// Harsher partial scale once the longer string dwarfs the shorter.
const LONG_PARTIAL_SCALE: f64 = 0.6;

/// Length ratio beyond which partial (substring) scoring takes over from
/// token scoring.
const PARTIAL_CUTOVER: f64 = 1.5;

/// Length ratio beyond which the harsher partial scale applies.
const LONG_CUTOVER: f64 = 8.0;

/// Scores extracted field values against candidate sets and accepts the best
/// match only at or above the configured threshold.
pub struct FuzzyMatcher {
    threshold: f64,
}

impl FuzzyMatcher {
    /// Creates a matcher with the given acceptance threshold in 0..=100.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Finds the best (candidate, score, query value) triple across every
    /// query value for a field.
    ///
    /// Returns an unmatched result when no candidate reaches the threshold;
    /// a below-threshold best is discarded entirely rather than reported as
    /// low-confidence. Ties keep the first candidate encountered.
    pub fn match_field(
        &self,
        field_name: &str,
        query_values: &[String],
        candidates: &[String],
    ) -> MatchResult {
        let mut best_score = 0.0_f64;
        let mut best_candidate: Option<&str> = None;
        let mut best_query: Option<&str> = None;

        for query_value in query_values {
            for candidate in candidates {
                let score = score_pair(query_value, candidate);
                if score > best_score {
                    best_score = score;
                    best_candidate = Some(candidate);
                    best_query = Some(query_value);
                }
            }
        }

        match best_candidate {
            Some(candidate) if best_score >= self.threshold => {
                debug!(
                    field = field_name,
                    matched = candidate,
                    score = best_score,
                    "fuzzy match accepted"
                );
                MatchResult {
                    field_name: field_name.to_string(),
                    original_value: best_query.map(str::to_string),
                    matched_value: Some(candidate.to_string()),
                    score: best_score,
                }
            }
            _ => {
                debug!(
                    field = field_name,
                    best_score, "no candidate reached the acceptance threshold"
                );
                MatchResult::unmatched(field_name)
            }
        }
    }
}

/// Composite similarity of two strings as a whole number in 0..=100.
///
/// Similar-length pairs take the best of plain, token-sort, and token-set
/// similarity; heavily length-mismatched pairs fall back to windowed partial
/// similarity of the shorter string against the longer.
pub fn score_pair(query: &str, candidate: &str) -> f64 {
    let a = full_process(query);
    let b = full_process(candidate);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 100.0;
    }

    let base = ratio(&a, &b);
    let len_a = a.chars().count() as f64;
    let len_b = b.chars().count() as f64;
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);

    let best = if len_ratio < PARTIAL_CUTOVER {
        let token_sort = ratio(&sort_tokens(&a), &sort_tokens(&b)) * TOKEN_SCALE;
        let token_set = token_set_ratio(&a, &b) * TOKEN_SCALE;
        base.max(token_sort).max(token_set)
    } else {
        let scale = if len_ratio > LONG_CUTOVER {
            LONG_PARTIAL_SCALE
        } else {
            PARTIAL_SCALE
        };
        let partial = partial_ratio(&a, &b) * scale;
        let partial_sorted = partial_ratio(&sort_tokens(&a), &sort_tokens(&b)) * TOKEN_SCALE * scale;
        base.max(partial).max(partial_sorted)
    };

    best.round().clamp(0.0, 100.0)
}

/// Lowercases, replaces non-alphanumeric characters with spaces, and
/// collapses runs of whitespace.
fn full_process(s: &str) -> String {
    let mut cleaned = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                cleaned.push(lower);
            }
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain similarity scaled to 0..=100, unrounded.
fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Tokens sorted and rejoined, so word order stops mattering.
fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Set-based similarity: compares the shared-token core against each side's
/// full sorted token string, taking the best pairing.
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();

    let common = set_a
        .intersection(&set_b)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let only_a = set_a
        .difference(&set_b)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let only_b = set_b
        .difference(&set_a)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    let combined_a = join_tokens(&common, &only_a);
    let combined_b = join_tokens(&common, &only_b);

    ratio(&common, &combined_a)
        .max(ratio(&common, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

fn join_tokens(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{left} {right}"),
    }
}

/// Best similarity of the shorter string against every equal-length window
/// of the longer, scaled to 0..=100.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if chars_a.len() <= chars_b.len() {
        (&chars_a, &chars_b)
    } else {
        (&chars_b, &chars_a)
    };
    if shorter.is_empty() {
        return 0.0;
    }
    if shorter.len() == longer.len() {
        return ratio(a, b);
    }

    let needle: String = shorter.iter().collect();
    let mut best = 0.0_f64;
    for window in longer.windows(shorter.len()) {
        let haystack: String = window.iter().collect();
        let score = strsim::normalized_levenshtein(&needle, &haystack) * 100.0;
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}
