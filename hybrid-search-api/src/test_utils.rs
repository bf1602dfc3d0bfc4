//! Shared helpers for unit tests.

use axum::{body::Body, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::domain::search::{Document, DocumentId, FusedResult};

/// Serve `router` on an ephemeral local port and return its base URL.
pub(crate) async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub(crate) fn document(id: i64) -> Document {
    Document {
        id: DocumentId::Int(id),
        content: Some(format!("document {}", id)),
        metadata: json!({ "category": "pricing" }),
        created_at: None,
    }
}

/// Engine row with both sources present and the given fused score.
pub(crate) fn fused(id: i64, rrf_score: f64) -> FusedResult {
    FusedResult {
        keyword_score: Some(0.5),
        keyword_rank: Some(1),
        similarity_score: Some(0.8),
        semantic_rank: Some(1),
        rrf_score,
        ..FusedResult::unranked(document(id))
    }
}

pub(crate) async fn body_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
