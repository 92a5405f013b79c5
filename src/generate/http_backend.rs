//! HTTP generation backend
//!
//! Talks to an OpenAI-compatible completions endpoint. Out-of-capacity
//! responses map to `Error::ResourceExhausted` so the answer engine can run
//! its recovery path; `reload` rebuilds the client, dropping pooled
//! connections to the backend.

use super::Generator;
use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::debug;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: usize,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Generator backed by an HTTP completions service
pub struct HttpGenerator {
    client: RwLock<reqwest::Client>,
    base_url: String,
    model: String,
}

impl HttpGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: RwLock::new(build_client()?),
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| Error::Generation(format!("Failed to build HTTP client: {}", e)))
}

fn looks_like_oom(status: reqwest::StatusCode, body: &str) -> bool {
    status == reqwest::StatusCode::INSUFFICIENT_STORAGE
        || body.to_ascii_lowercase().contains("out of memory")
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        let request = self
            .client
            .read()
            .expect("client lock poisoned")
            .post(format!("{}/v1/completions", self.base_url))
            .json(&CompletionRequest {
                model: &self.model,
                prompt,
                max_tokens,
            });

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if looks_like_oom(status, &body) {
                return Err(Error::ResourceExhausted(format!(
                    "Generation backend out of capacity: {}",
                    body
                )));
            }
            return Err(Error::Generation(format!(
                "Generation backend returned {}: {}",
                status, body
            )));
        }

        let parsed: CompletionResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| Error::Generation("Backend returned no choices".to_string()))?;
        Ok(text)
    }

    /// Rough estimate at ~4 characters per token; the budget math only
    /// needs a consistent upper-bound-ish figure, not exact counts.
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }

    async fn reload(&self) -> Result<()> {
        debug!("Rebuilding generation HTTP client");
        let fresh = build_client()?;
        *self.client.write().expect("client lock poisoned") = fresh;
        Ok(())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
