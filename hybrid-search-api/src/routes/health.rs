use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

use super::error::method_not_allowed;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health).fallback(method_not_allowed))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
