// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed conversation history store.
//!
//! Each resolved query appends one turn carrying the raw query text, the
//! persisted result JSON, and the retrieval score as text. Turns are read
//! back newest first to seed canonicalization prompts with session context.

use addrag_core::error::AddragError;
use addrag_core::traits::ConversationStore;
use addrag_core::types::ConversationTurn;
use async_trait::async_trait;
use serde_json::Value;
use tokio_rusqlite::Connection;
use tracing::debug;

/// Persistent conversation history backed by SQLite.
///
/// All operations go through the single tokio-rusqlite background thread.
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Creates a new history store wrapping an existing connection.
    ///
    /// The connection must already have the schema applied (see
    /// [`crate::database::open_database`]).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ConversationStore for HistoryStore {
    async fn append(
        &self,
        session_id: &str,
        query: &str,
        response: &Value,
        score: Option<&str>,
    ) -> Result<(), AddragError> {
        let session = session_id.to_string();
        let query = query.to_string();
        let response_json =
            serde_json::to_string(response).map_err(|e| AddragError::Storage {
                source: Box::new(e),
            })?;
        let score = score.map(str::to_string);
        let created_at = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO conversation_history (session_id, query, response, score, \
                     created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![session, query, response_json, score, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;

        debug!(session_id, "conversation turn appended");
        Ok(())
    }

    async fn recent(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, AddragError> {
        let session_id = session_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, session_id, query, response, score, created_at \
                     FROM conversation_history WHERE session_id = ?1 \
                     ORDER BY id DESC LIMIT ?2",
                )?;
                let turns = stmt
                    .query_map(rusqlite::params![session_id, limit as i64], |row| {
                        let raw_response: String = row.get(3)?;
                        let response: Value =
                            serde_json::from_str(&raw_response).map_err(|e| {
                                rusqlite::Error::FromSqlConversionFailure(
                                    3,
                                    rusqlite::types::Type::Text,
                                    Box::new(e),
                                )
                            })?;
                        Ok(ConversationTurn {
                            id: row.get(0)?,
                            session_id: row.get(1)?,
                            query: row.get(2)?,
                            response,
                            score: row.get(4)?,
                            created_at: row.get(5)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(turns)
            })
            .await
            .map_err(crate::database::map_tr_err)
    }

    async fn clear_session(&self, session_id: &str) -> Result<usize, AddragError> {
        let session_id = session_id.to_string();
        self.conn
            .call(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM conversation_history WHERE session_id = ?1",
                    rusqlite::params![session_id],
                )?;
                Ok(deleted)
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}
