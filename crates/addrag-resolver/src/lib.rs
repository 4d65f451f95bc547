// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Address resolution pipeline for the Addrag service.
//!
//! Turns a free-text query into canonical structured addresses by chaining
//! LLM entity extraction, fuzzy matching against cached corpus values,
//! filtered vector retrieval with heuristic fallbacks, and LLM
//! canonicalization with short-lived session memory.
//!
//! ## Architecture
//!
//! - **EntityExtractor**: Tool-calling LLM extraction of address records
//! - **FuzzyMatcher**: Token-aware scoring of extracted values vs candidates
//! - **CandidateCache**: Per-field candidate sets, populated by corpus scans
//! - **SpanExtractor**: Regex heuristics for address-looking text spans
//! - **RetrievalOrchestrator**: Filtered and unfiltered vector searches
//! - **Canonicalizer**: LLM normalization into the canonical address shape
//! - **Resolver**: Wires the stages together behind a single entry point

pub mod cache;
pub mod canonicalizer;
pub mod extractor;
pub mod fuzzy;
pub mod resolver;
pub mod retrieval;
pub mod spans;

pub use cache::CandidateCache;
pub use canonicalizer::Canonicalizer;
pub use extractor::EntityExtractor;
pub use fuzzy::FuzzyMatcher;
pub use resolver::Resolver;
pub use retrieval::RetrievalOrchestrator;
pub use spans::SpanExtractor;
