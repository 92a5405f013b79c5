//! Embedding generation
//!
//! This module provides an abstraction over embedding models with:
//! - A trait for different embedding backends
//! - A local fastembed backend (feature `local-embed`) and an HTTP backend
//! - Batch processing for bounded memory and incremental progress
//!
//! Backends serialize model calls internally, so batches submitted in order
//! come back in order; the index relies on that to keep vector i aligned
//! with chunk i.

#[cfg(feature = "local-embed")]
mod fastembed_impl;
mod http_backend;

#[cfg(feature = "local-embed")]
pub use fastembed_impl::*;
pub use http_backend::*;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.backend.as_str() {
        #[cfg(feature = "local-embed")]
        "local" => Ok(Box::new(FastEmbedder::new(config)?)),
        "http" => Ok(Box::new(HttpEmbedder::new(config)?)),
        other => Err(Error::Config(format!(
            "Unknown embedding backend '{}' (expected \"local\" or \"http\")",
            other
        ))),
    }
}

/// Embed a single text, unwrapping the batch result
pub async fn embed_one(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let mut vectors = embedder.embed(vec![text.to_string()]).await?;
    vectors
        .pop()
        .ok_or_else(|| Error::Embedding("No embedding returned".to_string()))
}
