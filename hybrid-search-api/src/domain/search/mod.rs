//! Hybrid search - keyword + semantic retrieval over a document table,
//! narrowed by a JSON metadata filter.
//!
//! This module provides:
//! - **Filter validation and canonicalization** of the client's filter JSON
//! - **Query embedding** via an external provider (OpenAI)
//! - **Keyword + vector search** executed by a remote query engine (Postgres via Supabase RPC)
//! - **Reciprocal Rank Fusion (RRF)**, either engine-side or in-process
//!
//! # Architecture
//!
//! The service is built around trait abstractions for testability:
//!
//! - [`Embedder`] - Text embedding generation (OpenAI, mocks)
//! - [`QueryEngine`] - Remote search execution (Supabase, mocks)
//!
//! # Example
//!
//! ```ignore
//! use hybrid_search_api::domain::search::{SearchService, SearchConfig, SearchRequest};
//! use hybrid_search_api::domain::search::embedder::OpenAiEmbedder;
//! use hybrid_search_api::domain::search::engine::SupabaseQueryEngine;
//!
//! let embedder = OpenAiEmbedder::new(api_key);
//! let engine = SupabaseQueryEngine::new(client);
//! let service = SearchService::new(embedder, engine, SearchConfig::default());
//!
//! let response = service.search(&SearchRequest::new("pricing plans")).await?;
//! ```

mod fusion;
mod service;
mod traits;
mod types;

pub mod embedder;
pub mod engine;
pub mod filter;

pub use service::{SearchConfig, SearchService};
pub use traits::{Embedder, QueryEngine, SearchError, SearchStage};
pub use types::{
    DistanceMethod, FilterDiagnostics, FusionMode, SearchRequest, SearchResponse, DEFAULT_RRF_K,
    DEFAULT_WEIGHT,
};
#[cfg(test)]
pub use types::{Document, DocumentId, FusedResult};
