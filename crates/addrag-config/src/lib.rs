// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Addrag address resolution service.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and Elm-style diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use addrag_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Collection: {}", config.qdrant.collection);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AddragConfig, OllamaConfig, QdrantConfig, ResolverConfig, ServiceConfig, StorageConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to rich miette diagnostics with typo suggestions
///
/// Returns either a valid `AddragConfig` or a list of diagnostic errors.
pub fn load_and_validate() -> Result<AddragConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            // Read TOML source files for error source span information
            let toml_sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<AddragConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();

    // Local config
    if let Ok(content) = std::fs::read_to_string("addrag.toml") {
        let path = std::env::current_dir()
            .map(|d| d.join("addrag.toml").display().to_string())
            .unwrap_or_else(|_| "addrag.toml".to_string());
        sources.push((path, content));
    }

    // XDG user config
    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("addrag/addrag.toml");
        if let Ok(content) = std::fs::read_to_string(&path) {
            sources.push((path.display().to_string(), content));
        }
    }

    // System config
    let system_path = std::path::Path::new("/etc/addrag/addrag.toml");
    if let Ok(content) = std::fs::read_to_string(system_path) {
        sources.push((system_path.display().to_string(), content));
    }

    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_str_accepts_good_config() {
        let toml_str = r#"
[service]
host = "0.0.0.0"
port = 8088

[resolver]
fuzzy_threshold = 92.5
"#;
        let config = load_and_validate_str(toml_str).unwrap();
        assert_eq!(config.service.port, 8088);
        assert_eq!(config.resolver.fuzzy_threshold, 92.5);
    }

    #[test]
    fn validate_str_rejects_out_of_range_value() {
        let toml_str = r#"
[resolver]
score_threshold = 7.0
"#;
        let errors = load_and_validate_str(toml_str).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("score_threshold"))));
    }

    #[test]
    fn validate_str_surfaces_typo_suggestion() {
        let toml_str = r#"
[ollama]
chat_modle = "llama3.2"
"#;
        let errors = load_and_validate_str(toml_str).unwrap_err();
        let unknown = errors
            .iter()
            .find_map(|e| match e {
                ConfigError::UnknownKey { key, suggestion, .. } => {
                    Some((key.clone(), suggestion.clone()))
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(unknown.0, "chat_modle");
        assert_eq!(unknown.1.as_deref(), Some("chat_model"));
    }
}
