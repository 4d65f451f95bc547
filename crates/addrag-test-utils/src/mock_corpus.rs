// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Corpus double with scripted search results and a scan-count probe.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use addrag_core::error::AddragError;
use addrag_core::filter::CorpusFilter;
use addrag_core::traits::AddressCorpus;
use addrag_core::types::{PointId, RetrievalRecord, ScrollPage, ScrolledPoint};

/// One recorded `search` invocation.
#[derive(Debug, Clone)]
pub struct SearchCall {
    pub filter: Option<CorpusFilter>,
    pub limit: usize,
    pub score_threshold: Option<f64>,
}

/// A mock corpus.
///
/// Search results are popped from a FIFO queue; an exhausted queue yields
/// empty result sets. Scroll pages are served from a fixed point list using
/// numeric offsets, and every scroll call bumps a counter so tests can prove
/// a cache hit performed no corpus scan.
#[derive(Default)]
pub struct MockCorpus {
    searches: Arc<Mutex<VecDeque<Result<Vec<RetrievalRecord>, String>>>>,
    search_calls: Arc<Mutex<Vec<SearchCall>>>,
    points: Arc<Mutex<Vec<ScrolledPoint>>>,
    scroll_calls: AtomicUsize,
    count_calls: AtomicUsize,
    missing_collection: AtomicBool,
    fail_scans: AtomicBool,
}

impl MockCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one search result set.
    pub async fn add_search_results(&self, records: Vec<RetrievalRecord>) {
        self.searches.lock().await.push_back(Ok(records));
    }

    /// Queues a corpus failure for the next search.
    pub async fn add_search_error(&self, message: impl Into<String>) {
        self.searches.lock().await.push_back(Err(message.into()));
    }

    /// Replaces the scrollable point set.
    pub async fn set_points(&self, points: Vec<ScrolledPoint>) {
        *self.points.lock().await = points;
    }

    /// Marks the configured collection as absent.
    pub fn set_missing_collection(&self, missing: bool) {
        self.missing_collection.store(missing, Ordering::SeqCst);
    }

    /// Makes every subsequent count and scroll fail with a corpus error.
    pub fn set_fail_scans(&self, fail: bool) {
        self.fail_scans.store(fail, Ordering::SeqCst);
    }

    /// Every recorded search call, in order.
    pub async fn search_calls(&self) -> Vec<SearchCall> {
        self.search_calls.lock().await.clone()
    }

    /// Number of scroll pages served so far.
    pub fn scroll_calls(&self) -> usize {
        self.scroll_calls.load(Ordering::SeqCst)
    }

    /// Number of count probes served so far.
    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressCorpus for MockCorpus {
    async fn collection_exists(&self) -> Result<bool, AddragError> {
        Ok(!self.missing_collection.load(Ordering::SeqCst))
    }

    async fn count(&self, _filter: Option<&CorpusFilter>) -> Result<u64, AddragError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_scans.load(Ordering::SeqCst) {
            return Err(AddragError::Corpus {
                message: "mock count failure".to_string(),
                source: None,
            });
        }
        Ok(self.points.lock().await.len() as u64)
    }

    async fn scroll(
        &self,
        limit: usize,
        offset: Option<PointId>,
    ) -> Result<ScrollPage, AddragError> {
        self.scroll_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_scans.load(Ordering::SeqCst) {
            return Err(AddragError::Corpus {
                message: "mock scroll failure".to_string(),
                source: None,
            });
        }
        let points = self.points.lock().await;
        // Numeric offsets double as resume indexes.
        let start = match offset {
            Some(PointId::Num(n)) => n as usize,
            Some(PointId::Uuid(_)) | None => 0,
        };
        let end = (start + limit).min(points.len());
        let page: Vec<ScrolledPoint> = points[start..end].to_vec();
        let next_offset = if end < points.len() {
            Some(PointId::Num(end as u64))
        } else {
            None
        };
        Ok(ScrollPage {
            points: page,
            next_offset,
        })
    }

    async fn search(
        &self,
        _vector: &[f32],
        filter: Option<&CorpusFilter>,
        limit: usize,
        score_threshold: Option<f64>,
    ) -> Result<Vec<RetrievalRecord>, AddragError> {
        self.search_calls.lock().await.push(SearchCall {
            filter: filter.cloned(),
            limit,
            score_threshold,
        });
        match self.searches.lock().await.pop_front() {
            Some(Ok(records)) => Ok(records),
            Some(Err(message)) => Err(AddragError::Corpus {
                message,
                source: None,
            }),
            None => Ok(Vec::new()),
        }
    }
}
