// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Ollama API.
//!
//! Provides [`OllamaClient`] which handles request construction against
//! `/api/chat` and `/api/embeddings`. Every call is made exactly once;
//! failures and timeouts surface directly to the caller with no internal
//! retry.

use std::time::Duration;

use addrag_core::AddragError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{
    ApiErrorResponse, ChatApiRequest, ChatApiResponse, EmbeddingsApiRequest, EmbeddingsApiResponse,
};

/// HTTP client for Ollama API communication.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Creates a new Ollama API client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the Ollama server (e.g., "http://localhost:11434")
    /// * `timeout` - Per-request timeout applied to every call
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, AddragError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AddragError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Sends a chat request and returns the full response.
    pub async fn chat(&self, request: &ChatApiRequest) -> Result<ChatApiResponse, AddragError> {
        self.post("/api/chat", request).await
    }

    /// Sends an embedding request and returns the embedding vector response.
    pub async fn embeddings(
        &self,
        request: &EmbeddingsApiRequest,
    ) -> Result<EmbeddingsApiResponse, AddragError> {
        self.post("/api/embeddings", request).await
    }

    async fn post<T: serde::Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: &T,
    ) -> Result<R, AddragError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AddragError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    AddragError::Provider {
                        message: format!("HTTP request to {endpoint} failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, endpoint, "Ollama response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                format!("Ollama API error ({status}): {}", api_err.error)
            } else {
                format!("Ollama returned {status}: {body}")
            };
            return Err(AddragError::Provider {
                message,
                source: None,
            });
        }

        let body = response.text().await.map_err(|e| AddragError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        serde_json::from_str(&body).map_err(|e| AddragError::Provider {
            message: format!("failed to parse Ollama response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApiChatMessage, ChatOptions};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OllamaClient {
        OllamaClient::new(base_url.to_string(), Duration::from_secs(5)).unwrap()
    }

    fn test_chat_request() -> ChatApiRequest {
        ChatApiRequest {
            model: "llama3.2".into(),
            messages: vec![ApiChatMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            tools: None,
            stream: false,
            options: ChatOptions { temperature: 0.1 },
        }
    }

    #[tokio::test]
    async fn chat_success() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "model": "llama3.2",
            "message": {"role": "assistant", "content": "Hi there!"},
            "done": true
        });

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3.2",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.chat(&test_chat_request()).await.unwrap();

        assert_eq!(result.message.content, "Hi there!");
        assert!(result.message.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn chat_parses_tool_calls() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "function": {
                        "name": "extract_address",
                        "arguments": {"town": ["Auckland"], "postcode": ["1010"]}
                    }
                }]
            }
        });

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.chat(&test_chat_request()).await.unwrap();

        assert_eq!(result.message.tool_calls.len(), 1);
        let call = &result.message.tool_calls[0];
        assert_eq!(call.function.name, "extract_address");
        assert_eq!(call.function.arguments["postcode"][0], "1010");
    }

    #[tokio::test]
    async fn chat_makes_exactly_one_request_on_error() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({"error": "model is overloaded"});

        // A transient-looking status must still not be retried.
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(503).set_body_json(&error_body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.chat(&test_chat_request()).await;

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("overloaded"), "got: {err}");
    }

    #[tokio::test]
    async fn chat_error_body_surfaces_in_message() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({"error": "model 'nope' not found"});

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_json(&error_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.chat(&test_chat_request()).await.unwrap_err();
        assert!(matches!(err, AddragError::Provider { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn chat_timeout_maps_to_timeout_error() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "message": {"role": "assistant", "content": "too late"}
        });

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(&response_body)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            OllamaClient::new(server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.chat(&test_chat_request()).await.unwrap_err();
        assert!(matches!(err, AddragError::Timeout { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn embeddings_success() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({"embedding": [0.1, 0.2, 0.3]});

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_partial_json(serde_json::json!({
                "model": "nomic-embed-text:latest",
                "prompt": "12 Queen Street"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let request = EmbeddingsApiRequest {
            model: "nomic-embed-text:latest".into(),
            prompt: "12 Queen Street".into(),
        };
        let result = client.embeddings(&request).await.unwrap();
        assert_eq!(result.embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn base_url_trailing_slash_is_normalized() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({"embedding": [1.0]});

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let client = test_client(&format!("{}/", server.uri()));
        let request = EmbeddingsApiRequest {
            model: "m".into(),
            prompt: "p".into(),
        };
        assert!(client.embeddings(&request).await.is_ok());
    }
}
