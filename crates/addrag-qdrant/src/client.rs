// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Qdrant points API.
//!
//! Provides [`QdrantClient`] scoped to a single collection, covering the
//! count, scroll, and query endpoints plus the collections listing used by
//! health probes. Every call is made exactly once; failures and timeouts
//! surface directly to the caller with no internal retry.

use std::time::Duration;

use addrag_core::AddragError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{
    ApiEnvelope, ApiErrorEnvelope, CollectionsResult, CountRequest, CountResult, QueryRequest,
    QueryResult, ScrollRequest, ScrollResult,
};

/// HTTP client for Qdrant API communication, scoped to one collection.
#[derive(Debug, Clone)]
pub struct QdrantClient {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    timeout: Duration,
}

impl QdrantClient {
    /// Creates a new Qdrant API client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the Qdrant server (e.g., "http://localhost:6333")
    /// * `api_key` - Optional API key sent as the `api-key` header
    /// * `collection` - Collection all point operations are scoped to
    /// * `timeout` - Per-request timeout applied to every call
    pub fn new(
        base_url: String,
        api_key: Option<&str>,
        collection: String,
        timeout: Duration,
    ) -> Result<Self, AddragError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            headers.insert(
                "api-key",
                HeaderValue::from_str(key).map_err(|e| {
                    AddragError::Config(format!("invalid Qdrant API key header value: {e}"))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AddragError::Corpus {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection,
            timeout,
        })
    }

    /// The collection this client is scoped to.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Lists all collections on the server.
    pub async fn list_collections(&self) -> Result<CollectionsResult, AddragError> {
        let url = format!("{}/collections", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                AddragError::Timeout {
                    duration: self.timeout,
                }
            } else {
                AddragError::Corpus {
                    message: format!("HTTP request to /collections failed: {e}"),
                    source: Some(Box::new(e)),
                }
            }
        })?;
        self.unwrap_envelope(response, "/collections").await
    }

    /// Counts points in the collection, optionally filtered.
    pub async fn count(&self, request: &CountRequest) -> Result<CountResult, AddragError> {
        self.post_points("count", request).await
    }

    /// Fetches one page of points, payloads only.
    pub async fn scroll(&self, request: &ScrollRequest) -> Result<ScrollResult, AddragError> {
        self.post_points("scroll", request).await
    }

    /// Runs a ranked nearest-neighbor query.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResult, AddragError> {
        self.post_points("query", request).await
    }

    async fn post_points<T: serde::Serialize, R: DeserializeOwned>(
        &self,
        operation: &str,
        request: &T,
    ) -> Result<R, AddragError> {
        let url = format!(
            "{}/collections/{}/points/{operation}",
            self.base_url, self.collection
        );

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
                    AddragError::Corpus {
                        message: format!("HTTP request to points/{operation} failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        self.unwrap_envelope(response, operation).await
    }

    async fn unwrap_envelope<R: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> Result<R, AddragError> {
        let status = response.status();
        debug!(status = %status, operation, "Qdrant response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(err) = serde_json::from_str::<ApiErrorEnvelope>(&body) {
                format!("Qdrant API error ({status}): {}", err.status.error)
            } else {
                format!("Qdrant returned {status}: {body}")
            };
            return Err(AddragError::Corpus {
                message,
                source: None,
            });
        }

        let body = response.text().await.map_err(|e| AddragError::Corpus {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        let envelope: ApiEnvelope<R> =
            serde_json::from_str(&body).map_err(|e| AddragError::Corpus {
                message: format!("failed to parse Qdrant response: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(envelope.result)
    }
}
