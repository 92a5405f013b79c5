//! Custom error types for docent

use thiserror::Error;

/// Main error type for docent operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corrupted document: {0}")]
    Corrupted(String),

    #[error("Empty document: {0}")]
    EmptyDocument(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Whether the background pipeline should retry after this error.
    ///
    /// User-fixable faults (corrupted input, empty documents, validation)
    /// and missing documents abort immediately; transient extraction,
    /// embedding, and IO faults go through the bounded retry loop.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Extraction(_)
                | Error::Embedding(_)
                | Error::Processing(_)
                | Error::Io(_)
                | Error::Http(_)
        )
    }
}

/// Result type alias for docent
pub type Result<T> = std::result::Result<T, Error>;
