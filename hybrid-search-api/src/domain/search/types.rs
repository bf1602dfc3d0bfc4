//! Core types for the search domain.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use time::OffsetDateTime;

use super::filter::CanonicalFilter;

pub const DEFAULT_MATCH_COUNT: u32 = 10;
pub const DEFAULT_RRF_K: u32 = 50;
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Primary key of a document row; integer or text depending on the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Int(i64),
    Text(String),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Int(id) => write!(f, "{}", id),
            DocumentId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        DocumentId::Int(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId::Text(id.to_string())
    }
}

/// Vector-space metric used by the semantic search path.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DistanceMethod {
    #[default]
    Cosine,
    Euclidean,
    InnerProduct,
}

impl DistanceMethod {
    /// Comma separated list of accepted names, for error messages.
    pub fn supported() -> String {
        Self::iter().join(", ")
    }
}

/// Where fusion of the keyword and semantic rankings happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FusionMode {
    /// The query engine fuses and returns the final list.
    #[default]
    Engine,
    /// The query engine returns raw candidates and fusion runs in-process.
    InCore,
}

/// Stored document as returned by the query engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

/// A document's position in one source ranking (keyword or semantic).
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHit {
    pub document: Document,
    /// 1-based, 1 is the most relevant.
    pub rank: u32,
    pub score: Option<f64>,
}

impl RankedHit {
    pub fn new(document: Document, rank: u32, score: Option<f64>) -> Self {
        Self {
            document,
            rank,
            score,
        }
    }

    /// Assign ranks 1..n in the given order.
    pub fn rank_in_order(
        documents: impl IntoIterator<Item = (Document, Option<f64>)>,
    ) -> Vec<RankedHit> {
        documents
            .into_iter()
            .zip(1..)
            .map(|((document, score), rank)| RankedHit::new(document, rank, score))
            .collect()
    }
}

/// The two independent rankings a fused result is built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedCandidates {
    pub keyword: Vec<RankedHit>,
    pub semantic: Vec<RankedHit>,
}

/// One entry of the fused ranking, with per-source provenance.
///
/// This is also the row shape returned by the engine-side hybrid function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FusedResult {
    pub id: DocumentId,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    pub keyword_score: Option<f64>,
    pub keyword_rank: Option<u32>,
    pub similarity_score: Option<f64>,
    pub semantic_rank: Option<u32>,
    #[serde(default)]
    pub rrf_score: f64,
}

impl FusedResult {
    /// Result for a document not yet seen in any source.
    pub fn unranked(document: Document) -> Self {
        Self {
            id: document.id,
            content: document.content,
            metadata: document.metadata,
            created_at: document.created_at,
            keyword_score: None,
            keyword_rank: None,
            similarity_score: None,
            semantic_rank: None,
            rrf_score: 0.0,
        }
    }
}

/// Parameters of a search, after request decoding but before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    /// Raw filter as sent by the client.
    pub filter: Value,
    /// `None` uses the configured default.
    pub match_count: Option<u32>,
    pub full_text_weight: f64,
    pub semantic_weight: f64,
    pub rrf_k: u32,
    pub distance_method: String,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            filter: Value::Object(Default::default()),
            match_count: None,
            full_text_weight: DEFAULT_WEIGHT,
            semantic_weight: DEFAULT_WEIGHT,
            rrf_k: DEFAULT_RRF_K,
            distance_method: DistanceMethod::default().to_string(),
        }
    }
}

/// Parameters sent to the query engine.
#[derive(Debug, Clone, Serialize)]
pub struct EngineRequest<'a> {
    pub query_text: &'a str,
    pub query_embedding: &'a [f32],
    pub match_count: u32,
    pub metadata_filter: &'a CanonicalFilter,
    pub full_text_weight: f64,
    pub semantic_weight: f64,
    pub rrf_k: u32,
    pub distance_method: DistanceMethod,
}

/// Both representations of the request filter, attached to failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterDiagnostics {
    pub original_filter: Value,
    pub transformed_filter: CanonicalFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub search_params: SearchParams,
    pub summary: SearchSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: DocumentId,
    pub content: Option<String>,
    pub metadata: Value,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    pub search_scores: SearchScores,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchScores {
    pub keyword_score: Option<f64>,
    pub keyword_rank: Option<u32>,
    pub similarity_score: Option<f64>,
    pub semantic_rank: Option<u32>,
    pub rrf_score: f64,
}

impl From<FusedResult> for SearchHit {
    fn from(result: FusedResult) -> Self {
        Self {
            id: result.id,
            content: result.content,
            metadata: result.metadata,
            created_at: result.created_at,
            search_scores: SearchScores {
                keyword_score: result.keyword_score,
                keyword_rank: result.keyword_rank,
                similarity_score: result.similarity_score,
                semantic_rank: result.semantic_rank,
                rrf_score: result.rrf_score,
            },
        }
    }
}

/// Echo of the effective parameters used for the search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchParams {
    pub query: String,
    pub original_filter: Value,
    pub transformed_filter: CanonicalFilter,
    pub match_count: u32,
    pub full_text_weight: f64,
    pub semantic_weight: f64,
    pub rrf_k: u32,
    pub distance_method: DistanceMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSummary {
    pub total_results: usize,
    pub has_keyword_matches: bool,
    pub has_semantic_matches: bool,
    pub distance_method_used: DistanceMethod,
    pub filter_applied: bool,
    pub fusion: FusionMode,
}

impl SearchResponse {
    pub fn new(results: Vec<FusedResult>, search_params: SearchParams, fusion: FusionMode) -> Self {
        let results: Vec<SearchHit> = results.into_iter().map(SearchHit::from).collect();
        let summary = SearchSummary {
            total_results: results.len(),
            has_keyword_matches: results
                .iter()
                .any(|r| r.search_scores.keyword_score.is_some()),
            has_semantic_matches: results
                .iter()
                .any(|r| r.search_scores.similarity_score.is_some()),
            distance_method_used: search_params.distance_method,
            filter_applied: search_params.transformed_filter.is_applied(),
            fusion,
        };

        Self {
            results,
            search_params,
            summary,
        }
    }
}
