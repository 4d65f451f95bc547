// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding model double returning a fixed vector.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use addrag_core::error::AddragError;
use addrag_core::traits::EmbeddingModel;

/// A mock embedding model. Every call returns the same configured vector
/// and records the embedded text for later assertions.
pub struct MockEmbedder {
    vector: Vec<f32>,
    texts: Arc<Mutex<Vec<String>>>,
    failing: AtomicBool,
}

impl MockEmbedder {
    /// Creates a mock returning a small fixed vector.
    pub fn new() -> Self {
        Self::with_vector(vec![0.1, 0.2, 0.3])
    }

    /// Creates a mock returning the given vector.
    pub fn with_vector(vector: Vec<f32>) -> Self {
        Self {
            vector,
            texts: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent call fail with a provider error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every text embedded so far, in call order.
    pub async fn embedded_texts(&self) -> Vec<String> {
        self.texts.lock().await.clone()
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingModel for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AddragError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AddragError::Provider {
                message: "mock embedding failure".to_string(),
                source: None,
            });
        }
        self.texts.lock().await.push(text.to_string());
        Ok(self.vector.clone())
    }
}
