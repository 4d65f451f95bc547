// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The resolution pipeline: extraction, matching, retrieval, and
//! canonicalization wired together behind one entry point.
//!
//! Stage order for a query: extract structured records, fuzzy-match their
//! fields against the cached candidate vocabularies, search the corpus per
//! record (filtered, with unconditional fallback to unfiltered), fall back
//! to address-span searches when no record produced hits, always add the
//! whole-text safety-net search, then canonicalize every retained hit. A
//! query that retrieves nothing at all gets a conversational reply instead
//! of an address list.

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::json;
use tracing::{debug, info, warn};

use addrag_config::ResolverConfig;
use addrag_core::error::AddragError;
use addrag_core::traits::{
    AddressCorpus, CandidateStore, ChatModel, ConversationStore, EmbeddingModel,
};
use addrag_core::types::{
    AddressQuery, AttributedResults, ExtractedAddress, LlmResponse, MatchResult, Resolution,
    RetrievalRecord,
};

use crate::cache::CandidateCache;
use crate::canonicalizer::Canonicalizer;
use crate::extractor::EntityExtractor;
use crate::fuzzy::FuzzyMatcher;
use crate::retrieval::RetrievalOrchestrator;

/// Top-level orchestrator for address resolution requests.
///
/// Holds one of each pipeline stage plus the injected collaborator seams;
/// constructed once at startup and shared across requests.
pub struct Resolver {
    extractor: EntityExtractor,
    matcher: FuzzyMatcher,
    cache: CandidateCache,
    retrieval: RetrievalOrchestrator,
    canonicalizer: Canonicalizer,
    embedder: Arc<dyn EmbeddingModel>,
    memory: Arc<dyn ConversationStore>,
}

impl Resolver {
    pub fn new(
        chat: Arc<dyn ChatModel>,
        embedder: Arc<dyn EmbeddingModel>,
        corpus: Arc<dyn AddressCorpus>,
        candidates: Arc<dyn CandidateStore>,
        memory: Arc<dyn ConversationStore>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            extractor: EntityExtractor::new(chat.clone()),
            matcher: FuzzyMatcher::new(config.fuzzy_threshold),
            cache: CandidateCache::new(corpus.clone(), candidates, config.scroll_page_size),
            retrieval: RetrievalOrchestrator::new(
                corpus,
                embedder.clone(),
                config.default_top_k,
                config.score_threshold,
                config.overfetch,
            ),
            canonicalizer: Canonicalizer::new(chat, memory.clone(), config.history_turns),
            embedder,
            memory,
        }
    }

    /// Resolves one query end to end.
    ///
    /// Collaborator outages in extraction, embedding, and retrieval are
    /// fatal for the request; canonicalization failures degrade per record
    /// and conversation writes degrade to a warning.
    pub async fn resolve(&self, query: &AddressQuery) -> Result<Resolution, AddragError> {
        let session_id = query.session_id.as_deref();
        info!(
            query = %query.text,
            top_k = query.top_k,
            session = ?session_id,
            "resolving address query"
        );

        let records = self.extractor.extract(&query.text).await?;
        debug!(records = records.len(), "extracted address records");

        // One embedding of the raw text serves every search that follows.
        let query_vector = self.embedder.embed(&query.text).await?;

        let searches = records.iter().enumerate().map(|(i, record)| {
            let vector = query_vector.as_slice();
            async move {
                let matches = self.match_record(record).await?;
                let results = self.retrieval.retrieve_for_record(vector, &matches).await?;
                Ok::<AttributedResults, AddragError>(AttributedResults {
                    address_key: format!("address_{}", i + 1),
                    results,
                })
            }
        });
        let mut attributed: Vec<AttributedResults> = try_join_all(searches)
            .await?
            .into_iter()
            .filter(|set| !set.results.is_empty())
            .collect();

        // Span heuristics cover queries whose structured records led nowhere.
        if attributed.is_empty() {
            let spans = self.retrieval.retrieve_spans(&query.text).await?;
            debug!(spans = spans.len(), "span fallback retrieval");
            attributed.extend(spans);
        }

        let whole_text = self
            .retrieval
            .search_whole_text(&query_vector, query.top_k)
            .await?;
        if !whole_text.is_empty() {
            attributed.push(AttributedResults {
                address_key: query.text.clone(),
                results: whole_text,
            });
        }

        if attributed.is_empty() {
            info!("query retrieved nothing address-like, replying conversationally");
            let reply = self
                .canonicalizer
                .conversational(&query.text, session_id)
                .await?;
            return Ok(Resolution {
                llm_response: LlmResponse::Conversational(reply),
                extracted_address_matches: Vec::new(),
            });
        }

        // Result sets stay attributed to their keys; canonicalization works
        // over the flattened hits in that same order.
        let flattened: Vec<RetrievalRecord> = attributed
            .iter()
            .flat_map(|set| set.results.iter().cloned())
            .collect();
        let scored = self
            .canonicalizer
            .canonicalize(&flattened, &query.text, session_id)
            .await?;

        if scored.is_empty() {
            warn!("retrieved hits carried no usable addresses");
            if let Some(session) = session_id {
                let marker = json!({"error": "no_results"});
                if let Err(error) = self.memory.append(session, &query.text, &marker, None).await {
                    warn!(%error, "conversation write failed, response unaffected");
                }
            }
        }

        Ok(Resolution {
            llm_response: LlmResponse::Addresses(scored),
            extracted_address_matches: attributed,
        })
    }

    /// Fuzzy-matches each populated field of one extracted record against
    /// the cached candidate vocabulary for that field.
    async fn match_record(
        &self,
        record: &ExtractedAddress,
    ) -> Result<Vec<MatchResult>, AddragError> {
        let mut matches = Vec::new();
        for (field_name, values) in record.non_empty_fields() {
            let candidates = self.cache.candidates(field_name).await?;
            matches.push(self.matcher.match_field(field_name, values, &candidates));
        }
        Ok(matches)
    }
}
