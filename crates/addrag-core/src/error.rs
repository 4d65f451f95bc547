// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Addrag address resolution service.

use thiserror::Error;

/// The primary error type used across all Addrag collaborator traits and
/// pipeline operations.
///
/// Data-quality conditions (no fuzzy match, unparsable model output) are not
/// errors: they degrade to defined fallbacks inside the pipeline. This enum
/// covers the service-availability and integrity failures that must surface
/// to callers.
#[derive(Debug, Error)]
pub enum AddragError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Corpus errors (vector store unreachable, bad response, missing collection).
    #[error("corpus error: {message}")]
    Corpus {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Model provider errors (generation or embedding API failure).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
