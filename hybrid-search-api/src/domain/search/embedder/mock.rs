//! Mock embedder implementation for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::search::traits::{Embedder, Result, SearchError};

/// Mock embedder that returns configurable vectors.
///
/// Clones share the call counter, so a clone kept by the test observes calls
/// made through a boxed copy handed to the service.
#[derive(Clone)]
pub struct MockEmbedder {
    responses: Arc<Vec<Vec<f32>>>,
    call_count: Arc<AtomicUsize>,
    dimensions: usize,
    failure: Option<Arc<str>>,
}

impl MockEmbedder {
    /// Create a mock that always returns the same vector.
    pub fn returning(vector: Vec<f32>) -> Self {
        let dims = vector.len();
        Self {
            responses: Arc::new(vec![vector]),
            call_count: Arc::new(AtomicUsize::new(0)),
            dimensions: dims,
            failure: None,
        }
    }

    /// Create a mock with default 1536-dimensional zero vectors.
    pub fn default_dims() -> Self {
        Self::returning(vec![0.0; 1536])
    }

    /// Create a mock whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default_dims()
        }
    }

    /// Report `dimensions` while returning vectors of a different length.
    pub fn with_reported_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Get the number of times `embed` was called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::default_dims()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(SearchError::EmbeddingError(message.to_string()));
        }
        let response_idx = idx % self.responses.len();
        Ok(self.responses[response_idx].clone())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_fixed_vector() {
        let embedder = MockEmbedder::returning(vec![1.0, 2.0, 3.0]);

        let result = embedder.embed("test").await.unwrap();
        assert_eq!(result, vec![1.0, 2.0, 3.0]);
        assert_eq!(embedder.dimensions(), 3);
    }

    #[tokio::test]
    async fn mock_tracks_call_count_across_clones() {
        let embedder = MockEmbedder::default();
        let boxed: Box<dyn Embedder> = Box::new(embedder.clone());

        assert_eq!(embedder.call_count(), 0);
        boxed.embed("a").await.unwrap();
        boxed.embed("b").await.unwrap();
        assert_eq!(embedder.call_count(), 2);
    }

    #[tokio::test]
    async fn failing_mock_returns_embedding_error() {
        let embedder = MockEmbedder::failing("quota exceeded");

        let err = embedder.embed("a").await.unwrap_err();
        assert!(matches!(err, SearchError::EmbeddingError(ref msg) if msg == "quota exceeded"));
        assert_eq!(embedder.call_count(), 1);
    }
}
