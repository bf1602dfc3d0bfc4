use std::{sync::Arc, time::Duration};

use supabase_rpc::{Credentials, CredentialsError, SupabaseClient};

use crate::{
    config::Settings,
    domain::search::{
        embedder::OpenAiEmbedder, engine::SupabaseQueryEngine, Embedder, QueryEngine,
        SearchConfig, SearchError, SearchService,
    },
};

/// Search service over boxed collaborators, so the router is not generic.
pub type DynSearchService = SearchService<Box<dyn Embedder>, Box<dyn QueryEngine>>;

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("No embedding API key configured and OPENAI_API_KEY is not set")]
    MissingEmbeddingKey,
    #[error("Query engine credentials: {0}")]
    Credentials(#[from] CredentialsError),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error(transparent)]
    Search(#[from] SearchError),
}

#[derive(Clone)]
pub struct AppState {
    search_service: Arc<DynSearchService>,
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(search_service: DynSearchService, expose_error_details: bool) -> Self {
        Self {
            search_service: Arc::new(search_service),
            expose_error_details,
        }
    }

    /// Build the production collaborators from configuration.
    pub fn from_settings(settings: &Settings) -> Result<Self, AppStateError> {
        let embedding = &settings.embedding;
        let embedder = if embedding.api_key.is_empty() {
            OpenAiEmbedder::try_from_env().ok_or(AppStateError::MissingEmbeddingKey)?
        } else {
            OpenAiEmbedder::new(embedding.api_key.clone())
        };
        let embedder = embedder
            .with_api_url(embedding.api_url.clone())
            .with_model(embedding.model.clone())
            .with_dimensions(embedding.dimensions)
            .with_timeout(Duration::from_secs(embedding.request_timeout_secs))?;

        let engine_settings = &settings.query_engine;
        let credentials =
            if engine_settings.url.is_empty() || engine_settings.service_role_key.is_empty() {
                Credentials::from_env()?
            } else {
                Credentials::new(
                    engine_settings.url.clone(),
                    engine_settings.service_role_key.clone(),
                )
            };
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(engine_settings.request_timeout_secs))
            .build()?;
        let engine = SupabaseQueryEngine::new(SupabaseClient::with_http_client(credentials, http))
            .with_functions(
                engine_settings.hybrid_function.clone(),
                engine_settings.candidates_function.clone(),
            )
            .with_candidate_count(engine_settings.candidate_count);

        tracing::info!(
            model = %embedding.model,
            dimensions = embedding.dimensions,
            fusion = %engine_settings.fusion,
            "search collaborators configured"
        );

        Ok(Self::new(
            Self::service(Box::new(embedder), Box::new(engine), settings.search_config()),
            settings.application.expose_error_details,
        ))
    }

    pub fn service(
        embedder: Box<dyn Embedder>,
        engine: Box<dyn QueryEngine>,
        config: SearchConfig,
    ) -> DynSearchService {
        SearchService::new(embedder, engine, config)
    }

    pub fn search_service(&self) -> &DynSearchService {
        &self.search_service
    }
}
