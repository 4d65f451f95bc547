// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./addrag.toml` > `~/.config/addrag/addrag.toml` > `/etc/addrag/addrag.toml`
//! with environment variable overrides via `ADDRAG_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AddragConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/addrag/addrag.toml` (system-wide)
/// 3. `~/.config/addrag/addrag.toml` (user XDG config)
/// 4. `./addrag.toml` (local directory)
/// 5. `ADDRAG_*` environment variables
pub fn load_config() -> Result<AddragConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AddragConfig::default()))
        .merge(Toml::file("/etc/addrag/addrag.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("addrag/addrag.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("addrag.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a specific TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<AddragConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AddragConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AddragConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AddragConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AddragConfig::default()))
        .merge(Toml::file("/etc/addrag/addrag.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("addrag/addrag.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("addrag.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `ADDRAG_OLLAMA_CHAT_MODEL` must
/// map to `ollama.chat_model`, not `ollama.chat.model`.
fn env_provider() -> Env {
    Env::prefixed("ADDRAG_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: ADDRAG_QDRANT_API_KEY -> "qdrant_api_key"
        map_env_key(key.as_str()).into()
    })
}

/// Map a prefix-stripped, lowercased env var name onto its dotted config path.
fn map_env_key(key: &str) -> String {
    key.replacen("service_", "service.", 1)
        .replacen("qdrant_", "qdrant.", 1)
        .replacen("ollama_", "ollama.", 1)
        .replacen("storage_", "storage.", 1)
        .replacen("resolver_", "resolver.", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_str_applies_overrides() {
        let toml_str = r#"
[service]
port = 9191

[resolver]
fuzzy_threshold = 95.0
"#;
        let config = load_config_from_str(toml_str).unwrap();
        assert_eq!(config.service.port, 9191);
        assert_eq!(config.resolver.fuzzy_threshold, 95.0);
        // Untouched sections keep defaults.
        assert_eq!(config.ollama.url, "http://localhost:11434");
    }

    #[test]
    fn load_from_str_empty_gives_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.service.host, "127.0.0.1");
        assert_eq!(config.resolver.default_top_k, 1);
    }

    #[test]
    fn env_key_maps_section_prefix_only() {
        assert_eq!(map_env_key("qdrant_api_key"), "qdrant.api_key");
        assert_eq!(map_env_key("ollama_chat_model"), "ollama.chat_model");
        assert_eq!(
            map_env_key("resolver_fuzzy_threshold"),
            "resolver.fuzzy_threshold"
        );
        assert_eq!(
            map_env_key("storage_database_path"),
            "storage.database_path"
        );
        assert_eq!(map_env_key("service_port"), "service.port");
    }

    #[test]
    fn env_key_without_known_section_passes_through() {
        assert_eq!(map_env_key("mystery_key"), "mystery_key");
    }

    #[test]
    fn unknown_key_in_str_fails() {
        let toml_str = r#"
[resolver]
fuzy_threshold = 90.0
"#;
        assert!(load_config_from_str(toml_str).is_err());
    }
}
