//! Text generation
//!
//! Abstraction over the generation model with an HTTP backend. The model is
//! a shared singleton; `reload` is the recovery hook the answer engine calls
//! after a resource-exhaustion failure.

mod http_backend;

pub use http_backend::*;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for generation providers
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for `prompt`, bounded to `max_tokens` output
    /// tokens. Resource exhaustion must surface as
    /// [`crate::error::Error::ResourceExhausted`].
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String>;

    /// Estimate the input-token cost of a text
    fn count_tokens(&self, text: &str) -> usize;

    /// Release and re-acquire generation resources after a failure
    async fn reload(&self) -> Result<()>;

    /// Get the model name
    fn model_name(&self) -> &str;
}
