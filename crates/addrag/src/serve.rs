// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `addrag serve` command implementation.
//!
//! Opens the database, constructs the Ollama and Qdrant collaborators and
//! the resolution pipeline, and serves the HTTP API until interrupted.

use std::sync::Arc;

use tracing::info;

use addrag_config::AddragConfig;
use addrag_core::error::AddragError;
use addrag_core::traits::{
    AddressCorpus, CandidateStore, ChatModel, ConversationStore, EmbeddingModel,
};
use addrag_ollama::OllamaProvider;
use addrag_qdrant::QdrantCorpus;
use addrag_resolver::Resolver;
use addrag_storage::{FieldCandidateStore, HistoryStore};

use crate::server::{self, AppState};

/// Runs the `addrag serve` command.
///
/// Component construction happens once here; every request shares the
/// resulting resolver and stores through [`AppState`].
pub async fn run_serve(config: AddragConfig) -> Result<(), AddragError> {
    init_tracing(&config.service.log_level);

    info!(
        service = config.service.name.as_str(),
        "starting addrag serve"
    );

    let conn = addrag_storage::open_database(&config.storage.database_path).await?;
    let memory: Arc<dyn ConversationStore> = Arc::new(HistoryStore::new(conn.clone()));
    let candidates: Arc<dyn CandidateStore> = Arc::new(FieldCandidateStore::new(conn));

    // One Ollama client serves both model roles.
    let provider = Arc::new(OllamaProvider::new(&config.ollama)?);
    let chat: Arc<dyn ChatModel> = provider.clone();
    let embedder: Arc<dyn EmbeddingModel> = provider;

    let corpus: Arc<dyn AddressCorpus> = Arc::new(QdrantCorpus::new(&config.qdrant)?);

    let resolver = Arc::new(Resolver::new(
        chat.clone(),
        embedder.clone(),
        corpus.clone(),
        candidates,
        memory.clone(),
        config.resolver.clone(),
    ));

    let state = AppState {
        resolver,
        memory,
        corpus,
        chat,
        embedder,
    };
    let app = server::build_router(state);

    let addr = format!("{}:{}", config.service.host, config.service.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AddragError::Internal(format!("failed to bind {addr}: {e}")))?;

    info!("addrag server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AddragError::Internal(format!("server error: {e}")))?;

    info!("addrag serve shutdown complete");
    Ok(())
}

/// Resolves when SIGINT (Ctrl+C) or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = ctrl_c => {
                info!("received SIGINT (Ctrl+C), initiating shutdown");
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, initiating shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("received Ctrl+C, initiating shutdown");
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},hyper=warn,reqwest=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
