//! Default values for configuration

use std::path::PathBuf;

fn env_usize(name: &str, fallback: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

/// Default data directory (`~/.local/share/docent` or `./docent-data`)
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("docent"))
        .unwrap_or_else(|| PathBuf::from("docent-data"))
}

/// Default maximum pages accepted per document
pub fn default_max_pages() -> usize {
    env_usize("DOCENT_MAX_PAGES", 1000)
}

/// Default target chunk size in characters
pub fn default_chunk_size() -> usize {
    env_usize("DOCENT_CHUNK_SIZE", 1000)
}

/// Default overlap between adjacent chunks in characters
pub fn default_chunk_overlap() -> usize {
    env_usize("DOCENT_CHUNK_OVERLAP", 200)
}

/// Default maximum processing attempts per document
pub fn default_max_retries() -> usize {
    env_usize("DOCENT_MAX_RETRIES", 3)
}

/// Default delay between processing attempts in seconds
pub fn default_retry_delay_secs() -> u64 {
    1
}

/// Default embedding backend kind
pub fn default_embedding_backend() -> String {
    "local".to_string()
}

/// Default embedding model (matches the 384-dim MiniLM the index assumes)
pub fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

/// Default embedding dimension
pub fn default_embedding_dimension() -> usize {
    384
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default embedding backend URL
pub fn default_embedding_backend_url() -> String {
    std::env::var("DOCENT_EMBEDDING_BACKEND_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:7997".to_string())
}

/// Default generation model
pub fn default_generation_model() -> String {
    "google/flan-t5-base".to_string()
}

/// Default generation backend URL
pub fn default_generation_backend_url() -> String {
    std::env::var("DOCENT_GENERATION_BACKEND_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
}

/// Hard limit on input tokens the generation model accepts
pub fn default_max_input_tokens() -> usize {
    4096
}

/// Default bound on generated output tokens
pub fn default_max_output_tokens() -> usize {
    512
}

/// Tokens reserved for the answer when budgeting context
pub fn default_answer_reserve_tokens() -> usize {
    100
}

/// Candidate chunks fetched per question before token budgeting
pub fn default_retrieval_k() -> usize {
    5
}
