//! Trait definitions for search domain abstractions.
//!
//! These traits enable dependency injection and easy testing through mocking.

use async_trait::async_trait;
use strum::Display;

use super::filter::FilterError;
use super::types::{
    DistanceMethod, EngineRequest, FilterDiagnostics, FusedResult, RankedCandidates,
};

/// External call that failed while serving a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchStage {
    Embedding,
    QueryEngine,
}

/// Error type for search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Query parameter is required")]
    MissingQuery,

    #[error(
        "Invalid distance method: {0}. Supported methods are: {supported}",
        supported = DistanceMethod::supported()
    )]
    InvalidDistanceMethod(String),

    #[error("Invalid filter schema. Please check the filter structure and operators.")]
    InvalidFilter(#[source] FilterError),

    #[error("Embedding generation failed: {0}")]
    EmbeddingError(String),

    #[error("Query engine error: {0}")]
    QueryEngineError(String),

    /// A collaborator failed; carries both filter forms for diagnosis.
    #[error("Search failed during {stage}: {message}")]
    CollaboratorFailure {
        stage: SearchStage,
        message: String,
        diagnostics: Box<FilterDiagnostics>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SearchError {
    /// Attach the request's filters to a collaborator error.
    pub fn during(self, stage: SearchStage, diagnostics: &FilterDiagnostics) -> Self {
        match self {
            already @ SearchError::CollaboratorFailure { .. } => already,
            other => SearchError::CollaboratorFailure {
                stage,
                message: other.to_string(),
                diagnostics: Box::new(diagnostics.clone()),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Trait for text embedding generation.
///
/// Abstracts the embedding provider (OpenAI, mocks) for easy testing.
///
/// # Example
///
/// ```ignore
/// let embedder = OpenAiEmbedder::new(api_key);
/// let embedding = embedder.embed("pricing plans").await?;
/// assert_eq!(embedding.len(), 1536);
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Returns the embedding dimensions for this embedder.
    fn dimensions(&self) -> usize;
}

/// Trait for the remote hybrid-search engine.
///
/// Filtering, full-text and vector search all run on the engine side.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Keyword + semantic search fused by the engine with RRF.
    ///
    /// Results are expected in descending `rrf_score` order, at most
    /// `match_count` of them.
    async fn hybrid_search(&self, request: &EngineRequest<'_>) -> Result<Vec<FusedResult>>;

    /// The raw keyword and semantic rankings, for fusion in-process.
    async fn candidates(&self, request: &EngineRequest<'_>) -> Result<RankedCandidates>;
}

#[async_trait]
impl<T: Embedder + ?Sized> Embedder for Box<T> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text).await
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }
}

#[async_trait]
impl<T: QueryEngine + ?Sized> QueryEngine for Box<T> {
    async fn hybrid_search(&self, request: &EngineRequest<'_>) -> Result<Vec<FusedResult>> {
        (**self).hybrid_search(request).await
    }

    async fn candidates(&self, request: &EngineRequest<'_>) -> Result<RankedCandidates> {
        (**self).candidates(request).await
    }
}
