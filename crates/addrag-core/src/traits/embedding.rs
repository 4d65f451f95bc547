// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding model trait for similarity-search vectors.

use async_trait::async_trait;

use crate::error::AddragError;

/// Converts query text into the fixed-length vector the corpus is indexed
/// with.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embeds a single text. An embedding failure is a hard failure for the
    /// retrieval branch that requested it.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AddragError>;
}
