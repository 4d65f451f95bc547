// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache-aside candidate sets: the distinct known values of each corpus
//! field, enumerated once by a paginated full scan and persisted.
//!
//! Population for the same field is serialized through a per-field flight
//! lock so concurrent misses cannot race duplicate scans into the store.
//! Distinct fields populate independently. There is no invalidation: a
//! populated field is static until the store is cleared out-of-band.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use addrag_core::error::AddragError;
use addrag_core::filter::CorpusFilter;
use addrag_core::traits::{AddressCorpus, CandidateStore};
use addrag_core::types::{FieldCandidateSet, PointId};

/// Lazily populated field-name to candidate-value mapping backed by a
/// persistent [`CandidateStore`].
pub struct CandidateCache {
    corpus: Arc<dyn AddressCorpus>,
    store: Arc<dyn CandidateStore>,
    flights: DashMap<String, Arc<Mutex<()>>>,
    scroll_page_size: usize,
}

impl CandidateCache {
    pub fn new(
        corpus: Arc<dyn AddressCorpus>,
        store: Arc<dyn CandidateStore>,
        scroll_page_size: usize,
    ) -> Self {
        Self {
            corpus,
            store,
            flights: DashMap::new(),
            scroll_page_size,
        }
    }

    /// The distinct non-empty values of `field_name` across the corpus,
    /// from the store when already persisted and from a full scan otherwise.
    pub async fn candidates(&self, field_name: &str) -> Result<Vec<String>, AddragError> {
        if let Some(set) = self.store.get(field_name).await? {
            debug!(
                field = field_name,
                count = set.values.len(),
                "candidate set served from store"
            );
            return Ok(set.values);
        }

        let gate = self
            .flights
            .entry(field_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _populating = gate.lock().await;

        // A concurrent miss may have populated while we waited on the gate.
        if let Some(set) = self.store.get(field_name).await? {
            debug!(
                field = field_name,
                count = set.values.len(),
                "candidate set populated by concurrent request"
            );
            return Ok(set.values);
        }

        let set = self.scan_field(field_name).await?;
        self.store.put(&set).await?;
        info!(
            field = field_name,
            candidates = set.values.len(),
            "candidate set persisted"
        );
        Ok(set.values)
    }

    /// Full-corpus enumeration of a field's distinct non-empty values.
    async fn scan_field(&self, field_name: &str) -> Result<FieldCandidateSet, AddragError> {
        let filter = CorpusFilter::non_empty_field(field_name);
        let populated = self.corpus.count(Some(&filter)).await?;
        debug!(
            field = field_name,
            points = populated,
            "scanning corpus for candidate values"
        );

        let mut values: BTreeSet<String> = BTreeSet::new();
        let mut offset: Option<PointId> = None;
        loop {
            let page = self.corpus.scroll(self.scroll_page_size, offset).await?;
            for point in &page.points {
                if let Some(value) = point.payload.get(field_name).and_then(Value::as_str) {
                    let value = value.trim();
                    if !value.is_empty() {
                        values.insert(value.to_string());
                    }
                }
            }
            match page.next_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(FieldCandidateSet {
            field_name: field_name.to_string(),
            values: values.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addrag_test_utils::{InMemoryCandidateStore, MockCorpus};
    use serde_json::json;

    fn point(id: u64, entries: &[(&str, &str)]) -> addrag_core::types::ScrolledPoint {
        let mut payload = serde_json::Map::new();
        for (key, value) in entries {
            payload.insert(key.to_string(), json!(value));
        }
        addrag_core::types::ScrolledPoint {
            id: PointId::Num(id),
            payload,
        }
    }

    fn cache_over(corpus: Arc<MockCorpus>, store: Arc<InMemoryCandidateStore>) -> CandidateCache {
        CandidateCache::new(corpus, store, 100)
    }

    #[tokio::test]
    async fn miss_scans_the_corpus_and_persists() {
        let corpus = Arc::new(MockCorpus::new());
        corpus
            .set_points(vec![
                point(1, &[("town", "Wellington")]),
                point(2, &[("town", "Napier")]),
                point(3, &[("town", "Wellington")]),
            ])
            .await;
        let store = Arc::new(InMemoryCandidateStore::new());
        let cache = cache_over(corpus.clone(), store.clone());

        let values = cache.candidates("town").await.unwrap();
        assert_eq!(values, vec!["Napier", "Wellington"]);
        assert_eq!(corpus.count_calls(), 1);
        assert_eq!(corpus.scroll_calls(), 1);

        let persisted = store.get("town").await.unwrap().unwrap();
        assert_eq!(persisted.values, vec!["Napier", "Wellington"]);
    }

    #[tokio::test]
    async fn hit_serves_from_the_store_without_scanning() {
        let corpus = Arc::new(MockCorpus::new());
        let store = Arc::new(InMemoryCandidateStore::new());
        store
            .seed("town", vec!["Napier".into(), "Wellington".into()])
            .await;
        let cache = cache_over(corpus.clone(), store);

        let values = cache.candidates("town").await.unwrap();
        assert_eq!(values, vec!["Napier", "Wellington"]);
        assert_eq!(corpus.count_calls(), 0);
        assert_eq!(corpus.scroll_calls(), 0);
    }

    #[tokio::test]
    async fn blank_and_missing_values_are_dropped() {
        let corpus = Arc::new(MockCorpus::new());
        corpus
            .set_points(vec![
                point(1, &[("town", "Hastings")]),
                point(2, &[("town", "")]),
                point(3, &[("town", "   ")]),
                point(4, &[("region", "Hawkes Bay")]),
            ])
            .await;
        let store = Arc::new(InMemoryCandidateStore::new());
        let cache = cache_over(corpus, store);

        let values = cache.candidates("town").await.unwrap();
        assert_eq!(values, vec!["Hastings"]);
    }

    #[tokio::test]
    async fn scan_follows_pagination_to_the_end() {
        let corpus = Arc::new(MockCorpus::new());
        let points: Vec<_> = (0..5)
            .map(|i| point(i, &[("postcode", &format!("{:04}", 4000 + i)[..])]))
            .collect();
        corpus.set_points(points).await;
        let store = Arc::new(InMemoryCandidateStore::new());
        let cache = CandidateCache::new(corpus.clone(), store, 2);

        let values = cache.candidates("postcode").await.unwrap();
        assert_eq!(
            values,
            vec!["4000", "4001", "4002", "4003", "4004"]
        );
        assert_eq!(corpus.scroll_calls(), 3);
    }

    #[tokio::test]
    async fn concurrent_misses_for_one_field_scan_once() {
        let corpus = Arc::new(MockCorpus::new());
        corpus
            .set_points(vec![point(1, &[("region", "Manawatu")])])
            .await;
        let store = Arc::new(InMemoryCandidateStore::new());
        let cache = cache_over(corpus.clone(), store);

        let (a, b) = tokio::join!(cache.candidates("region"), cache.candidates("region"));
        assert_eq!(a.unwrap(), vec!["Manawatu"]);
        assert_eq!(b.unwrap(), vec!["Manawatu"]);
        assert_eq!(corpus.count_calls(), 1);
        assert_eq!(corpus.scroll_calls(), 1);
    }

    #[tokio::test]
    async fn distinct_fields_scan_independently() {
        let corpus = Arc::new(MockCorpus::new());
        corpus
            .set_points(vec![point(
                1,
                &[("town", "Wellington"), ("region", "Wellington")],
            )])
            .await;
        let store = Arc::new(InMemoryCandidateStore::new());
        let cache = cache_over(corpus.clone(), store.clone());

        let towns = cache.candidates("town").await.unwrap();
        let regions = cache.candidates("region").await.unwrap();
        assert_eq!(towns, vec!["Wellington"]);
        assert_eq!(regions, vec!["Wellington"]);
        assert_eq!(corpus.scroll_calls(), 2);
        assert!(store.get("town").await.unwrap().is_some());
        assert!(store.get("region").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn corpus_failure_propagates_and_persists_nothing() {
        let corpus = Arc::new(MockCorpus::new());
        corpus.set_fail_scans(true);
        let store = Arc::new(InMemoryCandidateStore::new());
        let cache = cache_over(corpus, store.clone());

        let err = cache.candidates("town").await.unwrap_err();
        assert!(matches!(err, AddragError::Corpus { .. }));
        assert!(store.get("town").await.unwrap().is_none());
    }
}
