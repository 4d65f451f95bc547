// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server assembly for the Addrag service.
//!
//! Builds the axum router and the shared handler state.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use addrag_core::traits::{AddressCorpus, ChatModel, ConversationStore, EmbeddingModel};
use addrag_resolver::Resolver;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The resolution pipeline, constructed once at startup.
    pub resolver: Arc<Resolver>,
    /// Conversation history, served directly by the history endpoints.
    pub memory: Arc<dyn ConversationStore>,
    /// Collaborators probed by the health endpoint.
    pub corpus: Arc<dyn AddressCorpus>,
    pub chat: Arc<dyn ChatModel>,
    pub embedder: Arc<dyn EmbeddingModel>,
}

/// Builds the service router:
/// - POST /api/v1/query-address
/// - GET /api/v1/history/{session_id}
/// - DELETE /api/v1/history/{session_id}
/// - GET /api/v1/rag/health
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/query-address", post(handlers::post_query_address))
        .route(
            "/api/v1/history/{session_id}",
            get(handlers::get_history).delete(handlers::delete_history),
        )
        .route("/api/v1/rag/health", get(handlers::get_rag_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
