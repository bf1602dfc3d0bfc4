//! Mock query engine implementation for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, RwLock};

use crate::domain::search::traits::{QueryEngine, Result, SearchError};
use crate::domain::search::types::{DistanceMethod, EngineRequest, FusedResult, RankedCandidates};

/// Owned copy of an [`EngineRequest`], kept for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub query_text: String,
    pub embedding_len: usize,
    pub match_count: u32,
    pub metadata_filter: Value,
    pub full_text_weight: f64,
    pub semantic_weight: f64,
    pub rrf_k: u32,
    pub distance_method: DistanceMethod,
}

impl From<&EngineRequest<'_>> for RecordedRequest {
    fn from(request: &EngineRequest<'_>) -> Self {
        Self {
            query_text: request.query_text.to_string(),
            embedding_len: request.query_embedding.len(),
            match_count: request.match_count,
            metadata_filter: request.metadata_filter.as_value().clone(),
            full_text_weight: request.full_text_weight,
            semantic_weight: request.semantic_weight,
            rrf_k: request.rrf_k,
            distance_method: request.distance_method,
        }
    }
}

/// Mock query engine returning canned results.
///
/// Clones share state, so a clone kept by the test sees the requests made
/// through the copy handed to the service.
#[derive(Clone, Default)]
pub struct MockQueryEngine {
    results: Arc<RwLock<Vec<FusedResult>>>,
    candidates: Arc<RwLock<RankedCandidates>>,
    failure: Arc<RwLock<Option<String>>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

#[allow(dead_code)]
impl MockQueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned by `hybrid_search`, truncated to `match_count`.
    pub fn with_results(self, results: Vec<FusedResult>) -> Self {
        *self.results.write().unwrap() = results;
        self
    }

    /// Rankings returned by `candidates`.
    pub fn with_candidates(self, candidates: RankedCandidates) -> Self {
        *self.candidates.write().unwrap() = candidates;
        self
    }

    /// Make every call fail with `message`.
    pub fn failing(message: &str) -> Self {
        let engine = Self::default();
        *engine.failure.write().unwrap() = Some(message.to_string());
        engine
    }

    pub fn call_count(&self) -> usize {
        self.requests.read().unwrap().len()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.read().unwrap().last().cloned()
    }

    fn record(&self, request: &EngineRequest<'_>) -> Result<()> {
        self.requests.write().unwrap().push(request.into());
        match self.failure.read().unwrap().as_ref() {
            Some(message) => Err(SearchError::QueryEngineError(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QueryEngine for MockQueryEngine {
    async fn hybrid_search(&self, request: &EngineRequest<'_>) -> Result<Vec<FusedResult>> {
        self.record(request)?;
        let results = self.results.read().unwrap();
        Ok(results
            .iter()
            .take(request.match_count as usize)
            .cloned()
            .collect())
    }

    async fn candidates(&self, request: &EngineRequest<'_>) -> Result<RankedCandidates> {
        self.record(request)?;
        Ok(self.candidates.read().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::filter::CanonicalFilter;
    use crate::test_utils::fused;

    fn request<'a>(filter: &'a CanonicalFilter, match_count: u32) -> EngineRequest<'a> {
        EngineRequest {
            query_text: "pricing",
            query_embedding: &[0.0, 1.0],
            match_count,
            metadata_filter: filter,
            full_text_weight: 1.0,
            semantic_weight: 0.5,
            rrf_k: 60,
            distance_method: DistanceMethod::Euclidean,
        }
    }

    #[tokio::test]
    async fn returns_results_up_to_match_count_and_records_request() {
        let engine = MockQueryEngine::new().with_results(vec![
            fused(1, 0.03),
            fused(2, 0.02),
            fused(3, 0.01),
        ]);
        let filter = CanonicalFilter::empty();

        let results = engine.hybrid_search(&request(&filter, 2)).await.unwrap();

        assert_eq!(results.len(), 2);
        let recorded = engine.last_request().unwrap();
        assert_eq!(recorded.query_text, "pricing");
        assert_eq!(recorded.embedding_len, 2);
        assert_eq!(recorded.rrf_k, 60);
        assert_eq!(recorded.distance_method, DistanceMethod::Euclidean);
    }

    #[tokio::test]
    async fn failing_engine_still_records_the_call() {
        let engine = MockQueryEngine::failing("connection reset");
        let filter = CanonicalFilter::empty();

        let err = engine.candidates(&request(&filter, 5)).await.unwrap_err();

        assert!(matches!(err, SearchError::QueryEngineError(ref m) if m == "connection reset"));
        assert_eq!(engine.call_count(), 1);
    }
}
