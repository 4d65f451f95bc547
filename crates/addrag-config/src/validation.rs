// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, non-empty URLs, and in-range thresholds.

use crate::diagnostic::ConfigError;
use crate::model::AddragConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AddragConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate host is not empty
    if config.service.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "service.host must not be empty".to_string(),
        });
    }

    // Validate host looks like a valid IP or hostname
    if !config.service.host.trim().is_empty() {
        let addr = config.service.host.trim();
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("service.host `{addr}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.service.port == 0 {
        errors.push(ConfigError::Validation {
            message: "service.port must be non-zero".to_string(),
        });
    }

    // Validate collaborator URLs are not empty
    if config.qdrant.url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "qdrant.url must not be empty".to_string(),
        });
    }

    if config.qdrant.collection.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "qdrant.collection must not be empty".to_string(),
        });
    }

    if config.ollama.url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "ollama.url must not be empty".to_string(),
        });
    }

    if config.ollama.chat_model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "ollama.chat_model must not be empty".to_string(),
        });
    }

    if config.ollama.embedding_model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "ollama.embedding_model must not be empty".to_string(),
        });
    }

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate resolver thresholds are in range
    if !(0.0..=100.0).contains(&config.resolver.fuzzy_threshold) {
        errors.push(ConfigError::Validation {
            message: format!(
                "resolver.fuzzy_threshold must be within [0, 100], got {}",
                config.resolver.fuzzy_threshold
            ),
        });
    }

    if !(0.0..=1.0).contains(&config.resolver.score_threshold) {
        errors.push(ConfigError::Validation {
            message: format!(
                "resolver.score_threshold must be within [0, 1], got {}",
                config.resolver.score_threshold
            ),
        });
    }

    if config.resolver.default_top_k < 1 || config.resolver.default_top_k > 10 {
        errors.push(ConfigError::Validation {
            message: format!(
                "resolver.default_top_k must be within [1, 10], got {}",
                config.resolver.default_top_k
            ),
        });
    }

    if config.resolver.scroll_page_size < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "resolver.scroll_page_size must be at least 1, got {}",
                config.resolver.scroll_page_size
            ),
        });
    }

    if config.qdrant.timeout_secs < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "qdrant.timeout_secs must be at least 1, got {}",
                config.qdrant.timeout_secs
            ),
        });
    }

    if config.ollama.timeout_secs < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "ollama.timeout_secs must be at least 1, got {}",
                config.ollama.timeout_secs
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
