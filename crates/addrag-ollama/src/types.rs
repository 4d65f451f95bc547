// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama HTTP API request/response types for `/api/chat` and `/api/embeddings`.

use serde::{Deserialize, Serialize};

// --- Chat types ---

/// A request to the Ollama `/api/chat` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatApiRequest {
    /// Model identifier (e.g., "llama3.2").
    pub model: String,

    /// Conversation messages in order.
    pub messages: Vec<ApiChatMessage>,

    /// Tool definitions available for the model to call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ApiToolDefinition>>,

    /// Whether to stream the response. Always `false` here.
    pub stream: bool,

    /// Generation options.
    pub options: ChatOptions,
}

/// Generation options passed through to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOptions {
    /// Sampling temperature.
    pub temperature: f32,
}

/// A single message in the Ollama chat format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiChatMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,

    /// Plain text content.
    pub content: String,
}

/// A tool definition in Ollama's function-calling envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiToolDefinition {
    /// Envelope type, always "function".
    #[serde(rename = "type")]
    pub definition_type: String,

    /// The function being described.
    pub function: ApiToolFunction,
}

/// The function payload of a tool definition.
#[derive(Debug, Clone, Serialize)]
pub struct ApiToolFunction {
    /// Function name (unique identifier).
    pub name: String,

    /// Human-readable description of what the function does.
    pub description: String,

    /// JSON Schema describing the function's parameters.
    pub parameters: serde_json::Value,
}

/// A response from the Ollama `/api/chat` endpoint.
///
/// Fields like `total_duration` and `eval_count` exist on the wire but are
/// not consumed, so they are not modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatApiResponse {
    /// The assistant message produced by the model.
    pub message: ApiResponseMessage,
}

/// The assistant message within a chat response.
///
/// When the model chooses to call a tool, `content` is typically empty and
/// `tool_calls` carries the structured invocations. Both default so either
/// shape deserializes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponseMessage {
    /// Plain text content.
    #[serde(default)]
    pub content: String,

    /// Structured tool invocations, if any.
    #[serde(default)]
    pub tool_calls: Vec<ApiToolCall>,
}

/// One tool invocation in a chat response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiToolCall {
    /// The invoked function.
    pub function: ApiToolCallFunction,
}

/// The function payload of a tool invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiToolCallFunction {
    /// Name of the invoked function.
    pub name: String,

    /// Arguments as a JSON object (not a string).
    pub arguments: serde_json::Value,
}

// --- Embedding types ---

/// A request to the Ollama `/api/embeddings` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingsApiRequest {
    /// Embedding model identifier (e.g., "nomic-embed-text:latest").
    pub model: String,

    /// Text to embed.
    pub prompt: String,
}

/// A response from the Ollama `/api/embeddings` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsApiResponse {
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

// --- Error types ---

/// Error body returned by Ollama on failed requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
