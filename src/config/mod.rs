//! Configuration management for docent
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! Every tunable has a sane default so the tool works without a config file.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base directory for uploads, indices, and status records
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum pages accepted per document
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Document processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generation model configuration
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Background processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Maximum processing attempts before a document is marked failed
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Fixed delay between attempts in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Target characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap characters carried between adjacent chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend kind: "local" (fastembed) or "http"
    #[serde(default = "default_embedding_backend")]
    pub backend: String,

    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Batch size for embedding
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// HTTP backend URL (used when backend = "http")
    #[serde(default = "default_embedding_backend_url")]
    pub backend_url: String,
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model name/identifier
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// HTTP backend URL (completions endpoint base)
    #[serde(default = "default_generation_backend_url")]
    pub backend_url: String,

    /// Hard limit on input tokens the model accepts
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    /// Bound on generated output tokens
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: usize,

    /// Tokens reserved for the answer when budgeting context
    #[serde(default = "default_answer_reserve_tokens")]
    pub answer_reserve_tokens: usize,

    /// Candidate chunks fetched per question before token budgeting
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_pages: default_max_pages(),
            processing: ProcessingConfig::default(),
            chunk: ChunkConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            batch_size: default_embedding_batch_size(),
            backend_url: default_embedding_backend_url(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            backend_url: default_generation_backend_url(),
            max_input_tokens: default_max_input_tokens(),
            max_output_tokens: default_max_output_tokens(),
            answer_reserve_tokens: default_answer_reserve_tokens(),
            retrieval_k: default_retrieval_k(),
        }
    }
}

/// Known embedding dimensions by model name
pub fn embedding_dimension_for_model(model: &str) -> Option<usize> {
    match model {
        "sentence-transformers/all-MiniLM-L6-v2" => Some(384),
        "BAAI/bge-small-en-v1.5" => Some(384),
        "BAAI/bge-base-en-v1.5" => Some(768),
        _ => None,
    }
}

impl Config {
    /// Default config file path (`<data_dir>/config.toml`)
    pub fn default_config_path() -> PathBuf {
        default_data_dir().join("config.toml")
    }

    /// Load configuration from a file, falling back to defaults when absent
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !path.exists() {
            if config_path.is_some() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            debug!("No config file found, using defaults");
            return Ok(Config::default());
        }

        debug!("Loading config from {:?}", path);
        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Directory holding uploaded PDF files
    pub fn upload_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Directory holding per-document vector indices
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("indices")
    }

    /// Path of the persisted document status records
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join("records.json")
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(Error::Config("max_pages must be at least 1".to_string()));
        }
        if self.chunk.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if self.chunk.chunk_overlap >= self.chunk.chunk_size {
            return Err(Error::Config(
                "chunk_overlap must be smaller than chunk_size".to_string(),
            ));
        }
        if self.processing.max_retries == 0 {
            return Err(Error::Config("max_retries must be at least 1".to_string()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::Config("batch_size must be positive".to_string()));
        }
        if let Some(expected) = embedding_dimension_for_model(&self.embedding.model) {
            if expected != self.embedding.dimension {
                return Err(Error::Config(format!(
                    "Model '{}' produces {}-dim embeddings, config says {}",
                    self.embedding.model, expected, self.embedding.dimension
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk.chunk_size, 1000);
        assert_eq!(config.chunk.chunk_overlap, 200);
        assert_eq!(config.embedding.batch_size, 32);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = Config::default();
        config.chunk.chunk_overlap = config.chunk.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut config = Config::default();
        config.embedding.dimension = 768;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.max_pages, config.max_pages);
        assert_eq!(parsed.generation.max_input_tokens, 4096);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::default();
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.chunk.chunk_size, config.chunk.chunk_size);
    }
}
