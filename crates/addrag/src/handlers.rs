// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the Addrag REST API.
//!
//! Handles POST /api/v1/query-address, GET and DELETE
//! /api/v1/history/{session_id}, and GET /api/v1/rag/health.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::info;

use addrag_core::error::AddragError;
use addrag_core::types::{AddressQuery, ConversationTurn, Resolution};

use crate::health::{self, HealthReport};
use crate::server::AppState;

/// Request body for POST /api/v1/query-address.
#[derive(Debug, Deserialize)]
pub struct QueryAddressRequest {
    /// Free-text, possibly partial address description.
    pub query: String,
    /// Number of similar addresses to retrieve (1..=10).
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Sampling temperature accepted by the API; the pipeline pins
    /// generation to 0.0.
    #[serde(default)]
    pub temperature: f64,
    /// Session for conversation memory; omit to disable history.
    #[serde(default)]
    pub session_id: Option<String>,
}

fn default_top_k() -> usize {
    1
}

/// Query parameters for GET /api/v1/history/{session_id}.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Maximum number of turns to return; clamped to 1..=100.
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    10
}

/// Response body for DELETE /api/v1/history/{session_id}.
#[derive(Debug, Serialize)]
pub struct DeleteHistoryResponse {
    pub session_id: String,
    pub deleted: usize,
}

/// Envelope for GET /api/v1/rag/health.
#[derive(Debug, Serialize)]
pub struct HealthEnvelope {
    pub data: HealthReport,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error paired with the HTTP status it maps to.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<AddragError> for ApiError {
    /// Collaborator outages surface as bad gateways, timeouts as gateway
    /// timeouts, and everything else as an internal error.
    fn from(err: AddragError) -> Self {
        let status = match &err {
            AddragError::Corpus { .. } | AddragError::Provider { .. } => StatusCode::BAD_GATEWAY,
            AddragError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AddragError::Config(_) | AddragError::Storage { .. } | AddragError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// POST /api/v1/query-address
///
/// Runs the full resolution pipeline over the query text. When the query
/// holds no detectable address the response degrades to a conversational
/// reply with an empty match list.
pub async fn post_query_address(
    State(state): State<AppState>,
    body: Result<Json<QueryAddressRequest>, JsonRejection>,
) -> Result<Json<Resolution>, ApiError> {
    let Json(body) = body?;

    if !(1..=10).contains(&body.top_k) {
        return Err(ApiError::unprocessable("top_k must be between 1 and 10"));
    }
    if !(0.0..=1.0).contains(&body.temperature) {
        return Err(ApiError::unprocessable(
            "temperature must be between 0.0 and 1.0",
        ));
    }

    let mut query = AddressQuery::new(body.query, body.top_k);
    query.session_id = body.session_id;

    let resolution = state.resolver.resolve(&query).await?;
    Ok(Json(resolution))
}

/// GET /api/v1/history/{session_id}
///
/// Returns the session's turns, most recent first. 404 when the session
/// has no history.
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<ConversationTurn>>, ApiError> {
    let limit = params.limit.clamp(1, 100);
    let turns = state.memory.recent(&session_id, limit).await?;
    if turns.is_empty() {
        return Err(ApiError::not_found(format!(
            "no history found for session {session_id}"
        )));
    }
    Ok(Json(turns))
}

/// DELETE /api/v1/history/{session_id}
///
/// Deletes all turns for the session and reports the count. 404 when
/// nothing was deleted.
pub async fn delete_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteHistoryResponse>, ApiError> {
    let deleted = state.memory.clear_session(&session_id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found(format!(
            "no history found for session {session_id}"
        )));
    }
    info!(session_id = session_id.as_str(), deleted, "session history cleared");
    Ok(Json(DeleteHistoryResponse {
        session_id,
        deleted,
    }))
}

/// GET /api/v1/rag/health
///
/// Probes each collaborator and reports per-component booleans. Always 200;
/// the body carries the health picture.
pub async fn get_rag_health(State(state): State<AppState>) -> Json<HealthEnvelope> {
    let data = health::probe(
        state.corpus.as_ref(),
        state.embedder.as_ref(),
        state.chat.as_ref(),
    )
    .await;
    Json(HealthEnvelope { data })
}
