//! Query engine backed by Postgres functions called through Supabase RPC.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use supabase_rpc::{RpcError, SupabaseClient};
use time::OffsetDateTime;

use crate::domain::search::traits::{QueryEngine, Result, SearchError};
use crate::domain::search::types::{
    Document, DocumentId, EngineRequest, FusedResult, RankedCandidates, RankedHit,
};

/// Function performing keyword + semantic search and RRF fusion in SQL.
pub const HYBRID_FUNCTION: &str = "search_documents_hybrid";
/// Function returning the two raw rankings, tagged by source.
pub const CANDIDATES_FUNCTION: &str = "search_documents_candidates";
pub const DEFAULT_CANDIDATE_COUNT: u32 = 50;

/// [`QueryEngine`] implementation calling Postgres functions via PostgREST.
#[derive(Clone, Debug)]
pub struct SupabaseQueryEngine {
    client: SupabaseClient,
    hybrid_function: String,
    candidates_function: String,
    candidate_count: u32,
}

/// Parameters of the candidates function: the hybrid parameters plus the
/// length of each source ranking.
#[derive(Serialize)]
struct CandidateParams<'a> {
    #[serde(flatten)]
    request: &'a EngineRequest<'a>,
    candidate_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CandidateSource {
    Keyword,
    Semantic,
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    id: DocumentId,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    metadata: Value,
    #[serde(default, with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
    source: CandidateSource,
    rank: u32,
    score: Option<f64>,
}

impl From<RpcError> for SearchError {
    fn from(e: RpcError) -> Self {
        SearchError::QueryEngineError(e.to_string())
    }
}

impl SupabaseQueryEngine {
    pub fn new(client: SupabaseClient) -> Self {
        Self {
            client,
            hybrid_function: HYBRID_FUNCTION.to_string(),
            candidates_function: CANDIDATES_FUNCTION.to_string(),
            candidate_count: DEFAULT_CANDIDATE_COUNT,
        }
    }

    /// Override the names of the Postgres functions.
    pub fn with_functions(
        mut self,
        hybrid_function: impl Into<String>,
        candidates_function: impl Into<String>,
    ) -> Self {
        self.hybrid_function = hybrid_function.into();
        self.candidates_function = candidates_function.into();
        self
    }

    /// Number of hits requested from each source in candidates mode.
    pub fn with_candidate_count(mut self, candidate_count: u32) -> Self {
        self.candidate_count = candidate_count;
        self
    }
}

#[async_trait]
impl QueryEngine for SupabaseQueryEngine {
    async fn hybrid_search(&self, request: &EngineRequest<'_>) -> Result<Vec<FusedResult>> {
        let results: Vec<FusedResult> = self.client.call(&self.hybrid_function, request).await?;
        tracing::debug!(rows = results.len(), "hybrid search returned");
        Ok(results)
    }

    async fn candidates(&self, request: &EngineRequest<'_>) -> Result<RankedCandidates> {
        let params = CandidateParams {
            request,
            // the fused list cannot be longer than what the sources return
            candidate_count: self.candidate_count.max(request.match_count),
        };
        let rows: Vec<CandidateRow> = self.client.call(&self.candidates_function, &params).await?;

        let mut candidates = RankedCandidates::default();
        for row in rows {
            let hit = RankedHit::new(
                Document {
                    id: row.id,
                    content: row.content,
                    metadata: row.metadata,
                    created_at: row.created_at,
                },
                row.rank,
                row.score,
            );
            match row.source {
                CandidateSource::Keyword => candidates.keyword.push(hit),
                CandidateSource::Semantic => candidates.semantic.push(hit),
            }
        }
        candidates.keyword.sort_by_key(|hit| hit.rank);
        candidates.semantic.sort_by_key(|hit| hit.rank);

        tracing::debug!(
            keyword = candidates.keyword.len(),
            semantic = candidates.semantic.len(),
            "candidates returned"
        );
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use supabase_rpc::Credentials;

    use crate::domain::search::filter::{canonicalize, CanonicalFilter};
    use crate::domain::search::types::DistanceMethod;
    use crate::test_utils::spawn_stub;

    type Captured = Arc<Mutex<Vec<Value>>>;

    async fn hybrid_rows(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
        captured.lock().unwrap().push(body);
        Json(json!([
            {
                "id": 1, "content": "Pricing plans", "metadata": { "lang": "en" },
                "created_at": "2024-05-01T12:00:00+00:00",
                "keyword_score": 0.4, "keyword_rank": 1,
                "similarity_score": 0.9, "semantic_rank": 1,
                "rrf_score": 0.0392
            },
            {
                "id": 2, "content": "Billing FAQ", "metadata": {},
                "created_at": null,
                "keyword_score": null, "keyword_rank": null,
                "similarity_score": 0.7, "semantic_rank": 2,
                "rrf_score": 0.0192
            }
        ]))
    }

    async fn candidate_rows(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
        captured.lock().unwrap().push(body);
        Json(json!([
            { "id": "b", "content": "B", "metadata": {}, "source": "semantic", "rank": 2, "score": 0.5 },
            { "id": "a", "content": "A", "metadata": {}, "source": "keyword", "rank": 1, "score": 3.1 },
            { "id": "c", "content": "C", "metadata": {}, "source": "semantic", "rank": 1, "score": 0.8 }
        ]))
    }

    async fn failing_rpc() -> (StatusCode, Json<Value>) {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "invalid input syntax for type json",
                "code": "22P02",
                "details": null,
                "hint": null
            })),
        )
    }

    async fn spawn_engine() -> (SupabaseQueryEngine, Captured) {
        let captured: Captured = Arc::default();
        let router = Router::new()
            .route("/rest/v1/rpc/search_documents_hybrid", post(hybrid_rows))
            .route("/rest/v1/rpc/search_documents_candidates", post(candidate_rows))
            .route("/rest/v1/rpc/broken", post(failing_rpc))
            .with_state(captured.clone());
        let base = spawn_stub(router).await;
        let client = SupabaseClient::new(Credentials::new(base, "service-role"));
        (SupabaseQueryEngine::new(client), captured)
    }

    fn request<'a>(embedding: &'a [f32], filter: &'a CanonicalFilter) -> EngineRequest<'a> {
        EngineRequest {
            query_text: "pricing",
            query_embedding: embedding,
            match_count: 5,
            metadata_filter: filter,
            full_text_weight: 1.0,
            semantic_weight: 1.0,
            rrf_k: 50,
            distance_method: DistanceMethod::Cosine,
        }
    }

    #[tokio::test]
    async fn hybrid_search_sends_engine_parameters() {
        let (engine, captured) = spawn_engine().await;
        let embedding = vec![0.1, 0.2];
        let filter = canonicalize(&json!({ "filter": { "filters": [
            { "field": "lang", "operator": "eq", "value": "en" }
        ]}}));

        let results = engine.hybrid_search(&request(&embedding, &filter)).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].keyword_rank, None);

        let body = captured.lock().unwrap()[0].clone();
        assert_eq!(body["query_text"], "pricing");
        assert_eq!(body["match_count"], 5);
        assert_eq!(body["rrf_k"], 50);
        assert_eq!(body["distance_method"], "cosine");
        assert_eq!(body["query_embedding"].as_array().unwrap().len(), 2);
        assert_eq!(body["metadata_filter"]["filters"][0]["field"], "lang");
    }

    #[tokio::test]
    async fn candidates_are_split_by_source_and_ordered_by_rank() {
        let (engine, captured) = spawn_engine().await;
        let engine = engine.with_candidate_count(20);
        let embedding = vec![0.1];
        let filter = CanonicalFilter::empty();

        let candidates = engine.candidates(&request(&embedding, &filter)).await.unwrap();

        assert_eq!(candidates.keyword.len(), 1);
        assert_eq!(candidates.keyword[0].document.id, DocumentId::from("a"));
        let semantic: Vec<_> = candidates.semantic.iter().map(|h| h.rank).collect();
        assert_eq!(semantic, vec![1, 2]);
        assert_eq!(candidates.semantic[0].document.id, DocumentId::from("c"));

        let body = captured.lock().unwrap()[0].clone();
        assert_eq!(body["candidate_count"], 20);
        assert_eq!(body["query_text"], "pricing");
    }

    #[tokio::test]
    async fn rpc_errors_become_query_engine_errors() {
        let (engine, _) = spawn_engine().await;
        let engine = engine.with_functions("broken", "broken");
        let embedding = vec![0.1];
        let filter = CanonicalFilter::empty();

        let err = engine
            .hybrid_search(&request(&embedding, &filter))
            .await
            .unwrap_err();

        match err {
            SearchError::QueryEngineError(message) => {
                assert!(message.contains("invalid input syntax for type json"), "{message}");
                assert!(message.contains("22P02"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
