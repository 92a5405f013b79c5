//! Sentence-based text chunking
//!
//! This module splits extracted page text into bounded, overlapping chunks:
//! - Sentence segmentation per UAX #29 (locale-aware boundaries)
//! - Character-budgeted accumulation with a greedy suffix overlap
//! - Stable, deterministic chunk ids of the form `"<page>-<ordinal>"`

use crate::config::ChunkConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// Metadata key under which search attaches the query distance
pub const SIMILARITY_KEY: &str = "similarity_score";

/// A chunk of document text, the atomic retrieval unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique id within the document, `"<page>-<ordinal>"`
    pub chunk_id: String,

    /// The chunk text (never empty)
    pub text: String,

    /// Zero-based page the chunk came from
    pub page_number: u32,

    /// Position, length, page; `similarity_score` is attached at query time
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl DocumentChunk {
    fn new(page_number: u32, ordinal: usize, text: String) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("position".to_string(), Value::from(ordinal));
        metadata.insert("length".to_string(), Value::from(text.chars().count()));
        metadata.insert("page".to_string(), Value::from(page_number));

        Self {
            chunk_id: format!("{}-{}", page_number, ordinal),
            text,
            page_number,
            metadata,
        }
    }

    /// Distance attached by the last search, if any
    pub fn similarity_score(&self) -> Option<f64> {
        self.metadata.get(SIMILARITY_KEY).and_then(Value::as_f64)
    }
}

/// Split one page of text into overlapping chunks.
///
/// Sentences accumulate into a buffer; when the next sentence would push the
/// buffer past `chunk_size` characters the buffer is flushed as a chunk and
/// reseeded with a suffix of its sentences whose combined length stays within
/// `chunk_overlap`. A single sentence longer than `chunk_size` still becomes
/// its own chunk. Pure function of its inputs.
pub fn chunk_page(text: &str, page_number: u32, config: &ChunkConfig) -> Vec<DocumentChunk> {
    let mut chunks = Vec::new();

    let mut buffer: Vec<&str> = Vec::new();
    let mut buffer_len = 0usize;
    let mut ordinal = 0usize;

    for sentence in text.split_sentence_bounds() {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        let sentence_len = sentence.chars().count();

        if buffer_len + sentence_len > config.chunk_size && !buffer.is_empty() {
            chunks.push(DocumentChunk::new(page_number, ordinal, buffer.join(" ")));
            ordinal += 1;

            // Reseed with a suffix of the closed buffer, picked from the end
            // backwards while it still fits the overlap budget.
            let mut overlap: Vec<&str> = Vec::new();
            let mut overlap_len = 0usize;
            for prev in buffer.iter().rev() {
                let prev_len = prev.chars().count();
                if overlap_len + prev_len > config.chunk_overlap {
                    break;
                }
                overlap.insert(0, prev);
                overlap_len += prev_len;
            }
            buffer = overlap;
            buffer_len = overlap_len;
        }

        buffer.push(sentence);
        buffer_len += sentence_len;
    }

    if !buffer.is_empty() {
        chunks.push(DocumentChunk::new(page_number, ordinal, buffer.join(" ")));
    }

    chunks
}
