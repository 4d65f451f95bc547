// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `addrag check` command implementation.
//!
//! Runs the collaborator health probes against the configured Qdrant and
//! Ollama endpoints and prints per-component status.

use std::time::Instant;

use addrag_config::AddragConfig;
use addrag_core::error::AddragError;
use addrag_ollama::OllamaProvider;
use addrag_qdrant::QdrantCorpus;

use crate::health::{self, HealthReport};

/// Runs the `addrag check` command.
///
/// Returns the probe report; the caller decides the exit code. Client
/// construction failures (bad URLs, unusable TLS setup) are errors, probe
/// failures are part of the report.
pub async fn run_check(config: &AddragConfig) -> Result<HealthReport, AddragError> {
    let provider = OllamaProvider::new(&config.ollama)?;
    let corpus = QdrantCorpus::new(&config.qdrant)?;

    let start = Instant::now();
    let report = health::probe(&corpus, &provider, &provider).await;
    let elapsed_ms = start.elapsed().as_millis();

    println!();
    println!("  addrag check");
    println!("  {}", "-".repeat(50));
    print_row("Qdrant collection", report.qdrant, &config.qdrant.collection);
    print_row("Ollama server", report.ollama, &config.ollama.url);
    print_row(
        "Embedding model",
        report.embedding_model,
        &config.ollama.embedding_model,
    );
    print_row("Chat model", report.chat_model, &config.ollama.chat_model);
    println!();

    let failures = failure_count(&report);
    if failures == 0 {
        println!("  All probes passed ({elapsed_ms}ms).");
    } else {
        let word = if failures == 1 { "probe" } else { "probes" };
        println!("  {failures} {word} failed ({elapsed_ms}ms).");
    }
    println!();

    Ok(report)
}

fn print_row(name: &str, healthy: bool, detail: &str) {
    if healthy {
        println!("    [OK]   {name:<20} {detail}");
    } else {
        println!("    [FAIL] {name:<20} {detail}");
    }
}

fn failure_count(report: &HealthReport) -> usize {
    [
        report.qdrant,
        report.ollama,
        report.embedding_model,
        report.chat_model,
    ]
    .iter()
    .filter(|healthy| !**healthy)
    .count()
}
