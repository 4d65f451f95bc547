// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation memory trait: per-session turn history.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AddragError;
use crate::types::ConversationTurn;

/// Append/read store for per-session conversation turns.
///
/// Writes are purely additive. Concurrent requests on one session may
/// interleave; the only ordering guarantee is that a completed write is
/// visible to subsequent reads.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Appends one turn. Callers treat a failure here as non-fatal for the
    /// primary response: log and continue.
    async fn append(
        &self,
        session_id: &str,
        query: &str,
        response: &Value,
        score: Option<&str>,
    ) -> Result<(), AddragError>;

    /// Up to `limit` most recent turns for the session, newest first.
    async fn recent(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, AddragError>;

    /// Deletes every turn for the session, returning how many were removed.
    async fn clear_session(&self, session_id: &str) -> Result<usize, AddragError>;
}
