//! Embedding generation implementations.

#[cfg(test)]
mod mock;
mod openai;

#[cfg(test)]
pub use mock::MockEmbedder;
pub use openai::OpenAiEmbedder;
