// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generative chat model trait.

use async_trait::async_trait;

use crate::error::AddragError;
use crate::types::{ChatRequest, ChatResponse};

/// A generative chat model used in two roles: entity extraction via
/// tool-calling and canonicalization via plain completion.
///
/// Implementations must bound every call with their configured timeout and
/// must not retry: a failed call surfaces as an error and the pipeline
/// degrades to its defined fallback instead.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends a completion request and returns the full response, including
    /// any structured tool calls the model emitted.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, AddragError>;
}
