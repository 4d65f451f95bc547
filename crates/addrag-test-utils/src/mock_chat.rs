// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted chat model for deterministic testing.
//!
//! `MockChat` implements [`ChatModel`] with pre-configured replies popped
//! from a FIFO queue, and records every request it receives so tests can
//! assert on prompt contents.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use addrag_core::error::AddragError;
use addrag_core::traits::ChatModel;
use addrag_core::types::{ChatRequest, ChatResponse, ToolCall};

/// One scripted reply: a full response or an error message to surface as a
/// provider failure.
type ScriptedReply = Result<ChatResponse, String>;

/// A mock chat model that returns pre-configured responses.
///
/// Replies are popped from a FIFO queue. When the queue is empty, a default
/// "mock response" completion is returned.
#[derive(Default)]
pub struct MockChat {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockChat {
    /// Creates a mock with an empty reply queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a plain-text completion.
    pub async fn add_text(&self, content: impl Into<String>) {
        self.replies.lock().await.push_back(Ok(ChatResponse {
            content: content.into(),
            tool_calls: Vec::new(),
        }));
    }

    /// Queues a response carrying a single tool call.
    pub async fn add_tool_call(&self, name: impl Into<String>, arguments: serde_json::Value) {
        self.replies.lock().await.push_back(Ok(ChatResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                name: name.into(),
                arguments,
            }],
        }));
    }

    /// Queues a full response (for multi-tool-call scripts).
    pub async fn add_response(&self, response: ChatResponse) {
        self.replies.lock().await.push_back(Ok(response));
    }

    /// Queues a provider failure.
    pub async fn add_error(&self, message: impl Into<String>) {
        self.replies.lock().await.push_back(Err(message.into()));
    }

    /// Every request received so far, in call order.
    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_reply(&self) -> ScriptedReply {
        self.replies.lock().await.pop_front().unwrap_or_else(|| {
            Ok(ChatResponse {
                content: "mock response".to_string(),
                tool_calls: Vec::new(),
            })
        })
    }
}

#[async_trait]
impl ChatModel for MockChat {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, AddragError> {
        self.requests.lock().await.push(request);
        match self.next_reply().await {
            Ok(response) => Ok(response),
            Err(message) => Err(AddragError::Provider {
                message,
                source: None,
            }),
        }
    }
}
