// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent store trait for per-field candidate sets.

use async_trait::async_trait;

use crate::error::AddragError;
use crate::types::FieldCandidateSet;

/// Key-value persistence for [`FieldCandidateSet`]s, keyed by field name.
///
/// The store itself is last-writer-wins; the candidate cache layered on top
/// serializes population per field so concurrent misses do not race a
/// duplicate corpus scan into it.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// The stored candidate set for a field, if one has been persisted.
    async fn get(&self, field_name: &str) -> Result<Option<FieldCandidateSet>, AddragError>;

    /// Persists a field's candidate set, replacing any previous entry.
    async fn put(&self, set: &FieldCandidateSet) -> Result<(), AddragError>;
}
