// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic extraction of address-bearing spans from free text.
//!
//! Used by the retrieval fallback when structured extraction produced no
//! usable hints: the raw text is cut into line and sentence segments, and
//! segments carrying a street pattern, a four-digit postcode, or a country
//! marker are kept as candidate spans for unfiltered semantic search.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Street-address shape: a number followed by a name and a street-type token.
static STREET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\s+[A-Za-z0-9\s]+(?:Rd|Road|St|Street|Ave|Avenue|Lane|Ln|Drive|Dr)\b").unwrap()
});

/// New Zealand postcodes are four digits.
static POSTCODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}\b").unwrap());

/// Country markers, either the ISO code or the full name.
static COUNTRY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:NZ|New Zealand)\b").unwrap());

/// Sentence terminators followed by whitespace split a line into segments.
static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Cuts free text into candidate address spans.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpanExtractor;

impl SpanExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Segments the text line- and sentence-wise and keeps the segments that
    /// look address-bearing, in input order, without duplicates.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut spans: Vec<String> = Vec::new();
        for line in text.lines() {
            for segment in SENTENCE_BREAK.split(line) {
                let span = segment.trim().trim_end_matches(['.', '!', '?']).trim();
                if span.is_empty() || spans.iter().any(|s| s == span) {
                    continue;
                }
                if STREET_PATTERN.is_match(span)
                    || POSTCODE_PATTERN.is_match(span)
                    || COUNTRY_PATTERN.is_match(span)
                {
                    spans.push(span.to_string());
                }
            }
        }
        debug!(count = spans.len(), "address span extraction complete");
        spans
    }
}
