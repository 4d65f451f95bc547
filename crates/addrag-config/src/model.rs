// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Addrag resolution service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Addrag configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AddragConfig {
    /// HTTP service identity and bind settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Qdrant vector database settings.
    #[serde(default)]
    pub qdrant: QdrantConfig,

    /// Ollama model server settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Resolution pipeline tuning settings.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// HTTP service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Address to bind the HTTP server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the HTTP server to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "addrag".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Qdrant vector database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QdrantConfig {
    /// Base URL of the Qdrant HTTP API.
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    /// API key sent in the `api-key` header. `None` disables authentication.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Name of the collection holding the address corpus.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Request timeout in seconds for Qdrant calls.
    #[serde(default = "default_qdrant_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
            collection: default_collection(),
            timeout_secs: default_qdrant_timeout_secs(),
        }
    }
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "new-zealand".to_string()
}

fn default_qdrant_timeout_secs() -> u64 {
    60
}

/// Ollama model server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Base URL of the Ollama HTTP API.
    #[serde(default = "default_ollama_url")]
    pub url: String,

    /// Model used for extraction and canonicalization chat calls.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used to embed query text for vector search.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Request timeout in seconds for Ollama calls.
    ///
    /// Chat generation on CPU-only hosts can take minutes, so this default
    /// is deliberately generous.
    #[serde(default = "default_ollama_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_ollama_timeout_secs(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_chat_model() -> String {
    "llama3.2".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text:latest".to_string()
}

fn default_ollama_timeout_secs() -> u64 {
    300
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("addrag").join("addrag.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("addrag.db"))
        .to_string_lossy()
        .into_owned()
}

/// Resolution pipeline tuning configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Minimum fuzzy match score (0..=100) for a field value to be
    /// accepted against the candidate vocabulary.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Number of results returned when the request does not specify `top_k`.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Minimum vector similarity score for the whole-text safety-net search.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// Extra results fetched beyond `top_k` before truncation.
    #[serde(default = "default_overfetch")]
    pub overfetch: usize,

    /// Number of prior conversation turns included in canonicalization prompts.
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,

    /// Page size used when scrolling the corpus to build candidate vocabularies.
    #[serde(default = "default_scroll_page_size")]
    pub scroll_page_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            default_top_k: default_top_k(),
            score_threshold: default_score_threshold(),
            overfetch: default_overfetch(),
            history_turns: default_history_turns(),
            scroll_page_size: default_scroll_page_size(),
        }
    }
}

fn default_fuzzy_threshold() -> f64 {
    98.0
}

fn default_top_k() -> usize {
    1
}

fn default_score_threshold() -> f64 {
    0.70
}

fn default_overfetch() -> usize {
    2
}

fn default_history_turns() -> usize {
    3
}

fn default_scroll_page_size() -> usize {
    100
}
