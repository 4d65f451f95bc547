// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Qdrant HTTP API request/response types for the points endpoints.

use addrag_core::PointId;
use serde::{Deserialize, Serialize};

// --- Filter types ---

/// A Qdrant filter clause. Empty clause lists are omitted from the wire.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiFilter {
    /// Conditions that must all hold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must: Option<Vec<ApiFieldCondition>>,

    /// Conditions that must not hold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_not: Option<Vec<ApiFieldCondition>>,
}

/// A single field condition within a filter clause.
#[derive(Debug, Clone, Serialize)]
pub struct ApiFieldCondition {
    /// Payload key the condition applies to.
    pub key: String,

    /// The match predicate.
    #[serde(rename = "match")]
    pub condition: ApiMatch,
}

/// A match predicate: full-text or exact value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ApiMatch {
    /// Full-text match (`{"text": ...}`).
    Text { text: String },
    /// Exact value match (`{"value": ...}`).
    Value { value: serde_json::Value },
}

// --- Count types ---

/// A request to `POST /collections/{collection}/points/count`.
#[derive(Debug, Clone, Serialize)]
pub struct CountRequest {
    /// Optional filter restricting which points are counted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<ApiFilter>,

    /// Whether to count exactly rather than approximate.
    pub exact: bool,
}

/// The `result` payload of a count response.
#[derive(Debug, Clone, Deserialize)]
pub struct CountResult {
    /// Number of matching points.
    pub count: u64,
}

// --- Scroll types ---

/// A request to `POST /collections/{collection}/points/scroll`.
#[derive(Debug, Clone, Serialize)]
pub struct ScrollRequest {
    /// Page size.
    pub limit: usize,

    /// Continuation token from the previous page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<PointId>,

    /// Whether to include payloads in the response.
    pub with_payload: bool,

    /// Whether to include vectors in the response.
    pub with_vector: bool,
}

/// The `result` payload of a scroll response.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrollResult {
    /// Points in this page.
    pub points: Vec<ApiScrolledPoint>,

    /// Offset for the next page; `null` when the scan is exhausted.
    #[serde(default)]
    pub next_page_offset: Option<PointId>,
}

/// One point in a scroll page.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiScrolledPoint {
    /// Point identifier.
    pub id: PointId,

    /// Payload fields.
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

// --- Query types ---

/// A request to `POST /collections/{collection}/points/query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    /// Query vector.
    pub query: Vec<f32>,

    /// Maximum number of results.
    pub limit: usize,

    /// Optional filter restricting the search space.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<ApiFilter>,

    /// Whether to include payloads in the response.
    pub with_payload: bool,

    /// Minimum similarity score for returned points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f64>,
}

/// The `result` payload of a query response.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResult {
    /// Ranked points, best first.
    pub points: Vec<ApiScoredPoint>,
}

/// One ranked point in a query response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiScoredPoint {
    /// Point identifier.
    pub id: PointId,

    /// Similarity score.
    pub score: f64,

    /// Payload fields.
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

// --- Collection types ---

/// The `result` payload of `GET /collections`.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionsResult {
    /// Known collections.
    pub collections: Vec<CollectionDescription>,
}

/// One collection in a collections listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionDescription {
    /// Collection name.
    pub name: String,
}

// --- Envelope types ---

/// The standard Qdrant response envelope (`{"result": ..., "status": "ok"}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    /// The operation result.
    pub result: T,
}

/// Error envelope returned on failed requests
/// (`{"status": {"error": "..."}}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    /// Error status payload.
    pub status: ApiErrorStatus,
}

/// The error payload within a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorStatus {
    /// Human-readable error message.
    pub error: String,
}
