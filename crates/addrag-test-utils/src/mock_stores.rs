// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store doubles for candidate sets and conversation history.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use addrag_core::error::AddragError;
use addrag_core::traits::{CandidateStore, ConversationStore};
use addrag_core::types::{ConversationTurn, FieldCandidateSet};

/// HashMap-backed [`CandidateStore`].
#[derive(Default)]
pub struct InMemoryCandidateStore {
    sets: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl InMemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a field's candidate set.
    pub async fn seed(&self, field_name: &str, values: Vec<String>) {
        self.sets
            .lock()
            .await
            .insert(field_name.to_string(), values);
    }
}

#[async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn get(&self, field_name: &str) -> Result<Option<FieldCandidateSet>, AddragError> {
        Ok(self
            .sets
            .lock()
            .await
            .get(field_name)
            .map(|values| FieldCandidateSet {
                field_name: field_name.to_string(),
                values: values.clone(),
            }))
    }

    async fn put(&self, set: &FieldCandidateSet) -> Result<(), AddragError> {
        self.sets
            .lock()
            .await
            .insert(set.field_name.clone(), set.values.clone());
        Ok(())
    }
}

/// Vec-backed [`ConversationStore`] with failure switches for exercising
/// the read- and write-failure degradation paths.
#[derive(Default)]
pub struct InMemoryConversationStore {
    turns: Arc<Mutex<Vec<ConversationTurn>>>,
    next_id: AtomicI64,
    fail_appends: AtomicBool,
    fail_reads: AtomicBool,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent append fail with a storage error.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent read fail with a storage error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Every persisted turn, oldest first.
    pub async fn turns(&self) -> Vec<ConversationTurn> {
        self.turns.lock().await.clone()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn append(
        &self,
        session_id: &str,
        query: &str,
        response: &Value,
        score: Option<&str>,
    ) -> Result<(), AddragError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AddragError::Storage {
                source: Box::new(std::io::Error::other("mock append failure")),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.turns.lock().await.push(ConversationTurn {
            id,
            session_id: session_id.to_string(),
            query: query.to_string(),
            response: response.clone(),
            score: score.map(|s| s.to_string()),
            created_at: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
        });
        Ok(())
    }

    async fn recent(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, AddragError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AddragError::Storage {
                source: Box::new(std::io::Error::other("mock read failure")),
            });
        }
        let turns = self.turns.lock().await;
        Ok(turns
            .iter()
            .rev()
            .filter(|t| t.session_id == session_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn clear_session(&self, session_id: &str) -> Result<usize, AddragError> {
        let mut turns = self.turns.lock().await;
        let before = turns.len();
        turns.retain(|t| t.session_id != session_id);
        Ok(before - turns.len())
    }
}
