// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-stage corpus retrieval: structured-filter search with unconditional
//! fallback to pure semantic search, plus the span and whole-text searches
//! that cover queries where structured extraction gave nothing to filter on.

use std::sync::Arc;

use tracing::debug;

use addrag_core::error::AddragError;
use addrag_core::filter::{CorpusFilter, FieldCondition};
use addrag_core::traits::{AddressCorpus, EmbeddingModel};
use addrag_core::types::{AttributedResults, MatchResult, RetrievalRecord};

use crate::spans::SpanExtractor;

/// Executes the pipeline's corpus searches.
pub struct RetrievalOrchestrator {
    corpus: Arc<dyn AddressCorpus>,
    embedder: Arc<dyn EmbeddingModel>,
    spans: SpanExtractor,
    default_top_k: usize,
    score_threshold: f64,
    overfetch: usize,
}

impl RetrievalOrchestrator {
    pub fn new(
        corpus: Arc<dyn AddressCorpus>,
        embedder: Arc<dyn EmbeddingModel>,
        default_top_k: usize,
        score_threshold: f64,
        overfetch: usize,
    ) -> Self {
        Self {
            corpus,
            embedder,
            spans: SpanExtractor::new(),
            default_top_k,
            score_threshold,
            overfetch,
        }
    }

    /// Searches for one extracted record: constrained by its accepted fuzzy
    /// matches when any exist, and retried unconstrained whenever the
    /// filtered search comes back empty.
    pub async fn retrieve_for_record(
        &self,
        vector: &[f32],
        matches: &[MatchResult],
    ) -> Result<Vec<RetrievalRecord>, AddragError> {
        let Some(filter) = build_filter(matches) else {
            return self
                .corpus
                .search(vector, None, self.default_top_k, None)
                .await;
        };
        let hits = self
            .corpus
            .search(vector, Some(&filter), self.default_top_k, None)
            .await?;
        if hits.is_empty() {
            debug!(
                conditions = filter.must.len(),
                "filtered search empty, retrying unfiltered"
            );
            return self
                .corpus
                .search(vector, None, self.default_top_k, None)
                .await;
        }
        Ok(hits)
    }

    /// Unconstrained searches for each address-looking span of the raw
    /// text. Only spans that produced hits come back, keyed by span text.
    pub async fn retrieve_spans(&self, text: &str) -> Result<Vec<AttributedResults>, AddragError> {
        let mut attributed = Vec::new();
        for span in self.spans.extract(text) {
            let vector = self.embedder.embed(&span).await?;
            let hits = self
                .corpus
                .search(&vector, None, self.default_top_k, None)
                .await?;
            debug!(span = %span, hits = hits.len(), "span fallback search");
            if !hits.is_empty() {
                attributed.push(AttributedResults {
                    address_key: span,
                    results: hits,
                });
            }
        }
        Ok(attributed)
    }

    /// Whole-text safety net: thresholded semantic search over the raw
    /// query, overfetched and then truncated to `top_k`. Scores are rounded
    /// to four decimal places.
    pub async fn search_whole_text(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalRecord>, AddragError> {
        let mut hits = self
            .corpus
            .search(
                vector,
                None,
                top_k + self.overfetch,
                Some(self.score_threshold),
            )
            .await?;
        hits.truncate(top_k);
        for hit in &mut hits {
            hit.score = (hit.score * 10_000.0).round() / 10_000.0;
        }
        Ok(hits)
    }
}

/// Conjunctive filter over a record's accepted matches. `None` when nothing
/// was accepted: that search runs unconstrained, never as an empty
/// conjunction.
pub(crate) fn build_filter(matches: &[MatchResult]) -> Option<CorpusFilter> {
    let mut filter = CorpusFilter::new();
    for m in matches {
        if let Some(ref value) = m.matched_value {
            filter = filter.must(FieldCondition::match_text(
                m.field_name.as_str(),
                value.as_str(),
            ));
        }
    }
    (!filter.is_empty()).then_some(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use addrag_core::types::PointId;
    use addrag_test_utils::{MockCorpus, MockEmbedder};
    use serde_json::json;

    fn accepted(field: &str, value: &str) -> MatchResult {
        MatchResult {
            field_name: field.to_string(),
            original_value: Some(value.to_string()),
            matched_value: Some(value.to_string()),
            score: 100.0,
        }
    }

    fn record(id: u64, score: f64, address: &str) -> RetrievalRecord {
        let mut payload = serde_json::Map::new();
        payload.insert("normalized_address".to_string(), json!(address));
        RetrievalRecord {
            id: PointId::Num(id),
            score,
            payload,
        }
    }

    fn orchestrator_over(
        corpus: Arc<MockCorpus>,
        embedder: Arc<MockEmbedder>,
    ) -> RetrievalOrchestrator {
        RetrievalOrchestrator::new(corpus, embedder, 3, 0.70, 2)
    }

    #[test]
    fn accepted_matches_build_a_conjunctive_filter() {
        let matches = vec![
            accepted("town", "Wellington"),
            MatchResult::unmatched("postcode"),
            accepted("region", "Wellington"),
        ];
        let filter = build_filter(&matches).unwrap();
        assert_eq!(
            filter.must,
            vec![
                FieldCondition::match_text("town", "Wellington"),
                FieldCondition::match_text("region", "Wellington"),
            ]
        );
        assert!(filter.must_not.is_empty());
    }

    #[test]
    fn all_unmatched_builds_no_filter() {
        let matches = vec![
            MatchResult::unmatched("town"),
            MatchResult::unmatched("postcode"),
        ];
        assert!(build_filter(&matches).is_none());
    }

    #[tokio::test]
    async fn filtered_hit_returns_without_retry() {
        let corpus = Arc::new(MockCorpus::new());
        corpus
            .add_search_results(vec![record(1, 0.9, "10 King Street, Wellington")])
            .await;
        let orchestrator = orchestrator_over(corpus.clone(), Arc::new(MockEmbedder::new()));

        let hits = orchestrator
            .retrieve_for_record(&[0.1, 0.2], &[accepted("town", "Wellington")])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let calls = corpus.search_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].limit, 3);
        assert_eq!(calls[0].score_threshold, None);
        let filter = calls[0].filter.as_ref().unwrap();
        assert_eq!(
            filter.must,
            vec![FieldCondition::match_text("town", "Wellington")]
        );
    }

    #[tokio::test]
    async fn empty_filtered_search_retries_unfiltered() {
        let corpus = Arc::new(MockCorpus::new());
        corpus.add_search_results(Vec::new()).await;
        corpus
            .add_search_results(vec![record(2, 0.8, "45 Queen Street, Auckland")])
            .await;
        let orchestrator = orchestrator_over(corpus.clone(), Arc::new(MockEmbedder::new()));

        let hits = orchestrator
            .retrieve_for_record(&[0.1, 0.2], &[accepted("town", "Auckland")])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, PointId::Num(2));

        let calls = corpus.search_calls().await;
        assert_eq!(calls.len(), 2);
        assert!(calls[0].filter.is_some());
        assert!(calls[1].filter.is_none());
    }

    #[tokio::test]
    async fn record_without_accepted_matches_searches_unfiltered_once() {
        let corpus = Arc::new(MockCorpus::new());
        corpus
            .add_search_results(vec![record(3, 0.6, "somewhere")])
            .await;
        let orchestrator = orchestrator_over(corpus.clone(), Arc::new(MockEmbedder::new()));

        let hits = orchestrator
            .retrieve_for_record(&[0.5], &[MatchResult::unmatched("town")])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let calls = corpus.search_calls().await;
        assert_eq!(calls.len(), 1);
        assert!(calls[0].filter.is_none());
    }

    #[tokio::test]
    async fn corpus_failure_propagates() {
        let corpus = Arc::new(MockCorpus::new());
        corpus.add_search_error("qdrant unreachable").await;
        let orchestrator = orchestrator_over(corpus, Arc::new(MockEmbedder::new()));

        let err = orchestrator
            .retrieve_for_record(&[0.5], &[accepted("town", "Napier")])
            .await
            .unwrap_err();
        assert!(matches!(err, AddragError::Corpus { .. }));
    }

    #[tokio::test]
    async fn spans_are_embedded_and_searched_individually() {
        let corpus = Arc::new(MockCorpus::new());
        corpus
            .add_search_results(vec![record(1, 0.9, "10 King Street, Wellington")])
            .await;
        corpus
            .add_search_results(vec![record(2, 0.8, "45 Queen Street, Auckland")])
            .await;
        let embedder = Arc::new(MockEmbedder::new());
        let orchestrator = orchestrator_over(corpus.clone(), embedder.clone());

        let attributed = orchestrator
            .retrieve_spans("10 King St\nno address here\n45 Queen Street")
            .await
            .unwrap();
        assert_eq!(attributed.len(), 2);
        assert_eq!(attributed[0].address_key, "10 King St");
        assert_eq!(attributed[1].address_key, "45 Queen Street");

        assert_eq!(
            embedder.embedded_texts().await,
            vec!["10 King St", "45 Queen Street"]
        );
        let calls = corpus.search_calls().await;
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.filter.is_none() && c.limit == 3));
    }

    #[tokio::test]
    async fn unproductive_spans_are_dropped() {
        let corpus = Arc::new(MockCorpus::new());
        corpus.add_search_results(Vec::new()).await;
        corpus
            .add_search_results(vec![record(2, 0.8, "45 Queen Street, Auckland")])
            .await;
        let orchestrator = orchestrator_over(corpus, Arc::new(MockEmbedder::new()));

        let attributed = orchestrator
            .retrieve_spans("10 King St\n45 Queen Street")
            .await
            .unwrap();
        assert_eq!(attributed.len(), 1);
        assert_eq!(attributed[0].address_key, "45 Queen Street");
    }

    #[tokio::test]
    async fn whole_text_overfetches_then_truncates_and_rounds() {
        let corpus = Arc::new(MockCorpus::new());
        corpus
            .add_search_results(vec![
                record(1, 0.912_345_67, "10 King Street, Wellington"),
                record(2, 0.87, "45 Queen Street, Auckland"),
                record(3, 0.75, "7 Ocean Ave, Napier"),
            ])
            .await;
        let orchestrator = orchestrator_over(corpus.clone(), Arc::new(MockEmbedder::new()));

        let hits = orchestrator.search_whole_text(&[0.1], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].score, 0.9123);
        assert_eq!(hits[1].score, 0.87);

        let calls = corpus.search_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].limit, 4);
        assert_eq!(calls[0].score_threshold, Some(0.70));
        assert!(calls[0].filter.is_none());
    }
}
