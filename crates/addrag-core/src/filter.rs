// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured filter model for corpus queries.
//!
//! Filters are built by the retrieval layer from accepted fuzzy matches and
//! translated into the corpus backend's wire format by the corpus client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single field predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldCondition {
    /// Full-text match on the field's value.
    MatchText { key: String, text: String },
    /// Exact match on the field's value.
    MatchValue { key: String, value: Value },
}

impl FieldCondition {
    pub fn match_text(key: impl Into<String>, text: impl Into<String>) -> Self {
        FieldCondition::MatchText {
            key: key.into(),
            text: text.into(),
        }
    }

    pub fn match_value(key: impl Into<String>, value: impl Into<Value>) -> Self {
        FieldCondition::MatchValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A conjunctive corpus filter: every `must` condition holds and no
/// `must_not` condition does.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorpusFilter {
    pub must: Vec<FieldCondition>,
    pub must_not: Vec<FieldCondition>,
}

impl CorpusFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required condition.
    pub fn must(mut self, condition: FieldCondition) -> Self {
        self.must.push(condition);
        self
    }

    /// Adds an excluded condition.
    pub fn must_not(mut self, condition: FieldCondition) -> Self {
        self.must_not.push(condition);
        self
    }

    /// True when the filter constrains nothing. An empty filter is passed to
    /// search as "no filter", never as an empty conjunction.
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }

    /// Filter selecting points whose `field` payload value is non-empty.
    /// Used when enumerating a field's candidate values.
    pub fn non_empty_field(field: &str) -> Self {
        Self::new().must_not(FieldCondition::match_value(field, ""))
    }
}
