// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector corpus trait: the indexed collection of known address records.

use async_trait::async_trait;

use crate::error::AddragError;
use crate::filter::CorpusFilter;
use crate::types::{PointId, RetrievalRecord, ScrollPage};

/// The searchable corpus of known, normalized address records.
///
/// The corpus is read-only from the pipeline's perspective; ingestion and
/// indexing happen elsewhere. Every operation is bounded by the client's
/// configured timeout, and a transport or backend error propagates as
/// [`AddragError::Corpus`] rather than being absorbed.
#[async_trait]
pub trait AddressCorpus: Send + Sync {
    /// Whether the configured collection exists. Used by health probes.
    async fn collection_exists(&self) -> Result<bool, AddragError>;

    /// Number of points matching the filter (all points when `None`).
    async fn count(&self, filter: Option<&CorpusFilter>) -> Result<u64, AddragError>;

    /// One page of a full-collection scan, payloads only. Pass the returned
    /// `next_offset` to continue; `None` means the scan is complete.
    async fn scroll(
        &self,
        limit: usize,
        offset: Option<PointId>,
    ) -> Result<ScrollPage, AddragError>;

    /// Ranked nearest-neighbor search, optionally constrained by a filter
    /// and a minimum similarity score.
    async fn search(
        &self,
        vector: &[f32],
        filter: Option<&CorpusFilter>,
        limit: usize,
        score_threshold: Option<f64>,
    ) -> Result<Vec<RetrievalRecord>, AddragError>;
}
