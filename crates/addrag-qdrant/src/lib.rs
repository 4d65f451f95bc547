// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Qdrant corpus adapter for the Addrag address resolution service.
//!
//! This crate implements [`AddressCorpus`] over the Qdrant HTTP API,
//! translating the structured [`CorpusFilter`] model into Qdrant filter
//! clauses and point responses back into core retrieval records.

pub mod client;
pub mod types;

use async_trait::async_trait;
use addrag_config::QdrantConfig;
use addrag_core::error::AddragError;
use addrag_core::filter::{CorpusFilter, FieldCondition};
use addrag_core::traits::AddressCorpus;
use addrag_core::types::{PointId, RetrievalRecord, ScrollPage, ScrolledPoint};
use tracing::info;

use crate::client::QdrantClient;
use crate::types::{
    ApiFieldCondition, ApiFilter, ApiMatch, CountRequest, QueryRequest, ScrollRequest,
};

/// Qdrant-backed corpus implementing [`AddressCorpus`].
pub struct QdrantCorpus {
    client: QdrantClient,
}

impl QdrantCorpus {
    /// Creates a new corpus adapter from the given configuration.
    pub fn new(config: &QdrantConfig) -> Result<Self, AddragError> {
        let client = QdrantClient::new(
            config.url.clone(),
            config.api_key.as_deref(),
            config.collection.clone(),
            std::time::Duration::from_secs(config.timeout_secs),
        )?;

        info!(collection = config.collection, "Qdrant corpus initialized");

        Ok(Self { client })
    }
}

/// Translates a structured [`CorpusFilter`] into Qdrant filter clauses.
fn filter_to_wire(filter: &CorpusFilter) -> ApiFilter {
    let convert = |conditions: &[FieldCondition]| -> Option<Vec<ApiFieldCondition>> {
        if conditions.is_empty() {
            return None;
        }
        Some(
            conditions
                .iter()
                .map(|c| match c {
                    FieldCondition::MatchText { key, text } => ApiFieldCondition {
                        key: key.clone(),
                        condition: ApiMatch::Text { text: text.clone() },
                    },
                    FieldCondition::MatchValue { key, value } => ApiFieldCondition {
                        key: key.clone(),
                        condition: ApiMatch::Value {
                            value: value.clone(),
                        },
                    },
                })
                .collect(),
        )
    };

    ApiFilter {
        must: convert(&filter.must),
        must_not: convert(&filter.must_not),
    }
}

#[async_trait]
impl AddressCorpus for QdrantCorpus {
    async fn collection_exists(&self) -> Result<bool, AddragError> {
        let collections = self.client.list_collections().await?;
        Ok(collections
            .collections
            .iter()
            .any(|c| c.name == self.client.collection()))
    }

    async fn count(&self, filter: Option<&CorpusFilter>) -> Result<u64, AddragError> {
        let request = CountRequest {
            filter: filter.map(filter_to_wire),
            exact: true,
        };
        let result = self.client.count(&request).await?;
        Ok(result.count)
    }

    async fn scroll(
        &self,
        limit: usize,
        offset: Option<PointId>,
    ) -> Result<ScrollPage, AddragError> {
        let request = ScrollRequest {
            limit,
            offset,
            with_payload: true,
            with_vector: false,
        };
        let result = self.client.scroll(&request).await?;

        Ok(ScrollPage {
            points: result
                .points
                .into_iter()
                .map(|p| ScrolledPoint {
                    id: p.id,
                    payload: p.payload,
                })
                .collect(),
            next_offset: result.next_page_offset,
        })
    }

    async fn search(
        &self,
        vector: &[f32],
        filter: Option<&CorpusFilter>,
        limit: usize,
        score_threshold: Option<f64>,
    ) -> Result<Vec<RetrievalRecord>, AddragError> {
        let request = QueryRequest {
            query: vector.to_vec(),
            limit,
            filter: filter.map(filter_to_wire),
            with_payload: true,
            score_threshold,
        };
        let result = self.client.query(&request).await?;

        Ok(result
            .points
            .into_iter()
            .map(|p| RetrievalRecord {
                id: p.id,
                score: p.score,
                payload: p.payload,
            })
            .collect())
    }
}
