// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `addrag config` command implementation.
//!
//! Prints the effective merged configuration as TOML with secrets redacted.

use addrag_config::AddragConfig;
use addrag_core::error::AddragError;

/// Runs the `addrag config` command.
pub fn run_config(config: &AddragConfig) -> Result<(), AddragError> {
    print!("{}", render(config)?);
    Ok(())
}

/// Renders the configuration as pretty TOML, masking the Qdrant API key.
fn render(config: &AddragConfig) -> Result<String, AddragError> {
    let mut shown = config.clone();
    if shown.qdrant.api_key.is_some() {
        shown.qdrant.api_key = Some("[redacted]".to_string());
    }

    toml::to_string_pretty(&shown)
        .map_err(|e| AddragError::Internal(format!("failed to render config: {e}")))
}
