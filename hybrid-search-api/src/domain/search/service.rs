//! Search service combining filter validation, embedding generation and hybrid search.

use tracing::instrument;

use super::filter::{self, canonicalize};
use super::fusion::{fuse, is_fused_order, FusionParams};
use super::traits::{Embedder, QueryEngine, Result, SearchError, SearchStage};
use super::types::{
    DistanceMethod, EngineRequest, FilterDiagnostics, FusedResult, FusionMode, SearchParams,
    SearchRequest, SearchResponse, DEFAULT_MATCH_COUNT,
};

/// Configuration for the search service.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of results when the request does not say
    pub default_match_count: u32,
    /// Upper bound applied to every request
    pub max_match_count: u32,
    /// Reject conditions whose value does not fit the operator
    pub strict_filter_values: bool,
    pub fusion: FusionMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_match_count: DEFAULT_MATCH_COUNT,
            max_match_count: 100,
            strict_filter_values: false,
            fusion: FusionMode::Engine,
        }
    }
}

/// Search service that validates a request and runs it against the query engine.
///
/// # Type Parameters
///
/// * `E` - Embedder implementation for generating query embeddings
/// * `Q` - QueryEngine implementation running keyword and vector search
///
/// # Examples
///
/// ```ignore
/// let service = SearchService::new(embedder, engine, SearchConfig::default());
/// let response = service.search(&SearchRequest::new("pricing")).await?;
/// ```
pub struct SearchService<E, Q>
where
    E: Embedder,
    Q: QueryEngine,
{
    embedder: E,
    engine: Q,
    config: SearchConfig,
}

impl<E, Q> SearchService<E, Q>
where
    E: Embedder,
    Q: QueryEngine,
{
    pub fn new(embedder: E, engine: Q, config: SearchConfig) -> Self {
        Self {
            embedder,
            engine,
            config,
        }
    }

    /// Create a search service with default configuration.
    #[allow(dead_code)]
    pub fn with_defaults(embedder: E, engine: Q) -> Self {
        Self::new(embedder, engine, SearchConfig::default())
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Execute a search request.
    ///
    /// Every input is validated before the first external call. The embedder
    /// and the query engine are then called once each, in that order.
    #[instrument(
        skip(self, request),
        fields(match_count = ?request.match_count, distance_method = %request.distance_method)
    )]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(SearchError::MissingQuery);
        }

        let distance_method: DistanceMethod = request
            .distance_method
            .parse()
            .map_err(|_| SearchError::InvalidDistanceMethod(request.distance_method.clone()))?;

        if let Some(expression) = filter::parse(&request.filter).map_err(SearchError::InvalidFilter)? {
            if self.config.strict_filter_values {
                expression.check_values().map_err(SearchError::InvalidFilter)?;
            }
            tracing::debug!(conditions = expression.condition_count(), "filter accepted");
        }

        let diagnostics = FilterDiagnostics {
            original_filter: request.filter.clone(),
            transformed_filter: canonicalize(&request.filter),
        };
        debug_assert!(filter::validate(diagnostics.transformed_filter.as_value()));

        let match_count = request
            .match_count
            .unwrap_or(self.config.default_match_count)
            .min(self.config.max_match_count);

        let embedding = self
            .embed(query)
            .await
            .map_err(|e| e.during(SearchStage::Embedding, &diagnostics))?;

        let engine_request = EngineRequest {
            query_text: query,
            query_embedding: &embedding,
            match_count,
            metadata_filter: &diagnostics.transformed_filter,
            full_text_weight: request.full_text_weight,
            semantic_weight: request.semantic_weight,
            rrf_k: request.rrf_k,
            distance_method,
        };

        let results = self
            .run(&engine_request)
            .await
            .map_err(|e| e.during(SearchStage::QueryEngine, &diagnostics))?;

        tracing::info!(results = results.len(), fusion = %self.config.fusion, "search completed");

        let FilterDiagnostics {
            original_filter,
            transformed_filter,
        } = diagnostics;
        let params = SearchParams {
            query: query.to_string(),
            original_filter,
            transformed_filter,
            match_count,
            full_text_weight: request.full_text_weight,
            semantic_weight: request.semantic_weight,
            rrf_k: request.rrf_k,
            distance_method,
        };

        Ok(SearchResponse::new(results, params, self.config.fusion))
    }

    async fn embed(&self, query: &str) -> Result<Vec<f32>> {
        let embedding = self.embedder.embed(query).await?;
        let expected = self.embedder.dimensions();
        if embedding.len() != expected {
            return Err(SearchError::EmbeddingError(format!(
                "expected {} dimensions, got {}",
                expected,
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    async fn run(&self, request: &EngineRequest<'_>) -> Result<Vec<FusedResult>> {
        match self.config.fusion {
            FusionMode::Engine => {
                let mut results = self.engine.hybrid_search(request).await?;
                if !is_fused_order(&results) {
                    tracing::warn!("query engine returned results out of rrf_score order");
                    results.sort_by(|a, b| b.rrf_score.total_cmp(&a.rrf_score));
                }
                results.truncate(request.match_count as usize);
                Ok(results)
            }
            FusionMode::InCore => {
                let candidates = self.engine.candidates(request).await?;
                let params = FusionParams {
                    full_text_weight: request.full_text_weight,
                    semantic_weight: request.semantic_weight,
                    rrf_k: request.rrf_k,
                    match_count: request.match_count,
                };
                Ok(fuse(&candidates.keyword, &candidates.semantic, &params))
            }
        }
    }
}
