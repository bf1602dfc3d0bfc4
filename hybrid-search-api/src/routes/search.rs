use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::{
    domain::search::{
        filter::is_truthy, DistanceMethod, SearchRequest, SearchResponse, DEFAULT_RRF_K,
        DEFAULT_WEIGHT,
    },
    AppState,
};

use super::{
    error::{method_not_allowed, ErrorCode},
    ApiError,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(search).fallback(method_not_allowed))
}

/// Request body; every field but `query` is optional.
#[derive(Debug, Default, Deserialize)]
struct SearchBody {
    query: Option<String>,
    /// `null` and a missing field both mean "no filter" and echo back as `{}`.
    metadata_filter: Option<Value>,
    /// Takes precedence over `metadata_filter` when set.
    filter: Option<Value>,
    match_count: Option<u32>,
    full_text_weight: Option<f64>,
    semantic_weight: Option<f64>,
    rrf_k: Option<u32>,
    distance_method: Option<String>,
}

impl From<SearchBody> for SearchRequest {
    fn from(body: SearchBody) -> Self {
        let filter = match body.filter {
            Some(filter) if is_truthy(&filter) => filter,
            _ => body
                .metadata_filter
                .unwrap_or_else(|| Value::Object(Default::default())),
        };

        SearchRequest {
            query: body.query.unwrap_or_default(),
            filter,
            match_count: body.match_count,
            full_text_weight: body.full_text_weight.unwrap_or(DEFAULT_WEIGHT),
            semantic_weight: body.semantic_weight.unwrap_or(DEFAULT_WEIGHT),
            rrf_k: body.rrf_k.unwrap_or(DEFAULT_RRF_K),
            distance_method: body
                .distance_method
                .unwrap_or_else(|| DistanceMethod::default().to_string()),
        }
    }
}

// The body is decoded by hand so that a missing content type, an oversized
// body or malformed JSON still yields a JSON error body.
#[instrument(name = "POST /search", skip(app_state, body))]
async fn search(
    State(app_state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let body = body?;
    let body: SearchBody = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        ApiError::bad_request(ErrorCode::InvalidRequestBody, "Invalid JSON request body")
            .with_details(e.to_string())
    })?;

    let request = SearchRequest::from(body);
    let response = app_state
        .search_service()
        .search(&request)
        .await
        .map_err(|e| ApiError::from(e).redacted(app_state.expose_error_details))?;

    Ok(Json(response))
}
