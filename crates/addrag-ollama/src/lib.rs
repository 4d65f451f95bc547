// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama provider adapter for the Addrag address resolution service.
//!
//! This crate implements [`ChatModel`] and [`EmbeddingModel`] against a
//! local or remote Ollama server, covering both tool-calling extraction
//! requests and plain completions.

pub mod client;
pub mod types;

use async_trait::async_trait;
use addrag_config::OllamaConfig;
use addrag_core::error::AddragError;
use addrag_core::traits::{ChatModel, EmbeddingModel};
use addrag_core::types::{ChatRequest, ChatResponse, ToolCall};
use tracing::info;

use crate::client::OllamaClient;
use crate::types::{
    ApiChatMessage, ApiToolDefinition, ApiToolFunction, ChatApiRequest, ChatOptions,
    EmbeddingsApiRequest,
};

/// Ollama provider implementing [`ChatModel`] and [`EmbeddingModel`].
///
/// Both traits share one HTTP client; the chat and embedding model names
/// come from configuration and are fixed for the provider's lifetime.
pub struct OllamaProvider {
    client: OllamaClient,
    chat_model: String,
    embedding_model: String,
}

impl OllamaProvider {
    /// Creates a new Ollama provider from the given configuration.
    pub fn new(config: &OllamaConfig) -> Result<Self, AddragError> {
        let client = OllamaClient::new(
            config.url.clone(),
            std::time::Duration::from_secs(config.timeout_secs),
        )?;

        info!(
            chat_model = config.chat_model,
            embedding_model = config.embedding_model,
            "Ollama provider initialized"
        );

        Ok(Self {
            client,
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    /// Converts a core [`ChatRequest`] to the Ollama wire format.
    fn to_api_request(&self, request: &ChatRequest) -> ChatApiRequest {
        let messages: Vec<ApiChatMessage> = request
            .messages
            .iter()
            .map(|m| ApiChatMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            })
            .collect();

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t| ApiToolDefinition {
                        definition_type: "function".to_string(),
                        function: ApiToolFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.parameters.clone(),
                        },
                    })
                    .collect(),
            )
        };

        ChatApiRequest {
            model: self.chat_model.clone(),
            messages,
            tools,
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
            },
        }
    }
}

#[async_trait]
impl ChatModel for OllamaProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, AddragError> {
        let api_request = self.to_api_request(&request);
        let response = self.client.chat(&api_request).await?;

        let tool_calls = response
            .message
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Ok(ChatResponse {
            content: response.message.content,
            tool_calls,
        })
    }
}

#[async_trait]
impl EmbeddingModel for OllamaProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AddragError> {
        let request = EmbeddingsApiRequest {
            model: self.embedding_model.clone(),
            prompt: text.to_string(),
        };
        let response = self.client.embeddings(&request).await?;
        Ok(response.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addrag_core::types::{ChatMessage, ToolDefinition};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_provider(base_url: &str) -> OllamaProvider {
        let config = OllamaConfig {
            url: base_url.to_string(),
            chat_model: "llama3.2".into(),
            embedding_model: "nomic-embed-text:latest".into(),
            timeout_secs: 5,
        };
        OllamaProvider::new(&config).unwrap()
    }

    #[test]
    fn to_api_request_maps_messages_and_temperature() {
        let provider = test_provider("http://localhost:11434");
        let request = ChatRequest::completion(
            vec![
                ChatMessage::system("You canonicalize addresses."),
                ChatMessage::user("12 Queen Street"),
            ],
            0.3,
        );

        let api_req = provider.to_api_request(&request);
        assert_eq!(api_req.model, "llama3.2");
        assert_eq!(api_req.messages.len(), 2);
        assert_eq!(api_req.messages[0].role, "system");
        assert_eq!(api_req.messages[1].content, "12 Queen Street");
        assert!(api_req.tools.is_none());
        assert!(!api_req.stream);
        assert_eq!(api_req.options.temperature, 0.3);
    }

    #[test]
    fn to_api_request_wraps_tools_in_function_envelope() {
        let provider = test_provider("http://localhost:11434");
        let request = ChatRequest::with_tools(
            vec![ChatMessage::user("extract this")],
            vec![ToolDefinition {
                name: "extract_address".into(),
                description: "Extract address fields".into(),
                parameters: serde_json::json!({"type": "object", "properties": {}}),
            }],
            0.0,
        );

        let api_req = provider.to_api_request(&request);
        let tools = api_req.tools.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].definition_type, "function");
        assert_eq!(tools[0].function.name, "extract_address");
    }

    #[tokio::test]
    async fn complete_returns_content_and_tool_calls() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "function": {
                        "name": "extract_address",
                        "arguments": {"locality": ["Ponsonby"]}
                    }
                }]
            }
        });

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3.2",
                "stream": false,
                "options": {"temperature": 0.1}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let response = provider
            .complete(ChatRequest::with_tools(
                vec![ChatMessage::user("10 Ponsonby Rd")],
                vec![ToolDefinition {
                    name: "extract_address".into(),
                    description: "Extract address fields".into(),
                    parameters: serde_json::json!({"type": "object"}),
                }],
                0.1,
            ))
            .await
            .unwrap();

        assert!(response.content.is_empty());
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "extract_address");
        assert_eq!(response.tool_calls[0].arguments["locality"][0], "Ponsonby");
    }

    #[tokio::test]
    async fn embed_uses_configured_embedding_model() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({"embedding": [0.5, -0.25]});

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_partial_json(serde_json::json!({
                "model": "nomic-embed-text:latest",
                "prompt": " Wellington"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let vector = provider.embed(" Wellington").await.unwrap();
        assert_eq!(vector, vec![0.5, -0.25]);
    }

    #[tokio::test]
    async fn complete_propagates_provider_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"error": "out of memory"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let err = provider
            .complete(ChatRequest::completion(
                vec![ChatMessage::user("ping")],
                0.0,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, AddragError::Provider { .. }));
    }
}
