// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator health probes.
//!
//! Each probe exercises the same client path the pipeline uses: the corpus
//! probe asks for the configured collection, the embedding probe embeds a
//! short literal, and the chat probe requests a plain completion. Probe
//! failures are reported as unhealthy, never propagated.

use addrag_core::traits::{AddressCorpus, ChatModel, EmbeddingModel};
use addrag_core::types::{ChatMessage, ChatRequest};
use serde::Serialize;
use tracing::warn;

/// Per-collaborator probe outcome.
///
/// `ollama` aggregates the two model probes: both models sit behind one
/// server, so either answering means the server is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub qdrant: bool,
    pub ollama: bool,
    pub embedding_model: bool,
    pub chat_model: bool,
}

impl HealthReport {
    /// True when every probe succeeded.
    pub fn all_healthy(&self) -> bool {
        self.qdrant && self.ollama && self.embedding_model && self.chat_model
    }
}

/// Probes every collaborator once and aggregates the outcome.
pub async fn probe(
    corpus: &dyn AddressCorpus,
    embedder: &dyn EmbeddingModel,
    chat: &dyn ChatModel,
) -> HealthReport {
    let qdrant = match corpus.collection_exists().await {
        Ok(present) => present,
        Err(e) => {
            warn!(error = %e, "corpus health probe failed");
            false
        }
    };

    let embedding_model = match embedder.embed("health").await {
        Ok(vector) => !vector.is_empty(),
        Err(e) => {
            warn!(error = %e, "embedding health probe failed");
            false
        }
    };

    let chat_model = match chat
        .complete(ChatRequest::completion(
            vec![ChatMessage::user("ping")],
            0.0,
        ))
        .await
    {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "chat health probe failed");
            false
        }
    };

    HealthReport {
        qdrant,
        ollama: embedding_model || chat_model,
        embedding_model,
        chat_model,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addrag_test_utils::{MockChat, MockCorpus, MockEmbedder};

    #[tokio::test]
    async fn healthy_collaborators_report_all_true() {
        let corpus = MockCorpus::new();
        let embedder = MockEmbedder::new();
        let chat = MockChat::new();

        let report = probe(&corpus, &embedder, &chat).await;

        assert!(report.qdrant);
        assert!(report.ollama);
        assert!(report.embedding_model);
        assert!(report.chat_model);
        assert!(report.all_healthy());
    }

    #[tokio::test]
    async fn missing_collection_fails_only_the_corpus_probe() {
        let corpus = MockCorpus::new();
        corpus.set_missing_collection(true);
        let embedder = MockEmbedder::new();
        let chat = MockChat::new();

        let report = probe(&corpus, &embedder, &chat).await;

        assert!(!report.qdrant);
        assert!(report.embedding_model);
        assert!(report.chat_model);
        assert!(!report.all_healthy());
    }

    #[tokio::test]
    async fn embedding_outage_leaves_ollama_up_via_chat() {
        let corpus = MockCorpus::new();
        let embedder = MockEmbedder::new();
        embedder.set_failing(true);
        let chat = MockChat::new();

        let report = probe(&corpus, &embedder, &chat).await;

        assert!(!report.embedding_model);
        assert!(report.chat_model);
        assert!(report.ollama);
    }

    #[tokio::test]
    async fn both_models_down_marks_ollama_down() {
        let corpus = MockCorpus::new();
        let embedder = MockEmbedder::new();
        embedder.set_failing(true);
        let chat = MockChat::new();
        chat.add_error("connection refused").await;

        let report = probe(&corpus, &embedder, &chat).await;

        assert!(report.qdrant);
        assert!(!report.ollama);
        assert!(!report.embedding_model);
        assert!(!report.chat_model);
    }

    #[test]
    fn report_serializes_with_snake_case_keys() {
        let report = HealthReport {
            qdrant: true,
            ollama: false,
            embedding_model: true,
            chat_model: false,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"qdrant\":true"));
        assert!(json.contains("\"embedding_model\":true"));
        assert!(json.contains("\"chat_model\":false"));
    }
}
