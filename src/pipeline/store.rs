//! Document status records and their store
//!
//! The pipeline keeps exactly one record per document id. The store is an
//! explicit, injectable object rather than ambient global state; it can be
//! purely in-memory (tests) or backed by a JSON file so separate CLI
//! invocations observe pipeline state.

use crate::error::Result;
use crate::extract::PdfSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::warn;

/// Lifecycle state of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Completed,
    Error,
}

/// Descriptive metadata captured at upload and enriched during processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_size: u64,
    pub total_pages: usize,
    pub chunk_count: usize,
    pub average_chunk_length: f32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Per-document state owned by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document_id: String,
    pub filename: String,
    pub status: DocumentStatus,
    /// Monotonic processing fraction in 0.0..=1.0
    pub progress: f32,
    /// Human-readable description of the current processing step
    pub message: Option<String>,
    /// Terminal failure reason, set when status is Error
    pub error: Option<String>,
    pub metadata: DocumentMetadata,
}

impl DocumentRecord {
    pub fn new(document_id: String, filename: String, file_size: u64, summary: PdfSummary) -> Self {
        Self {
            document_id,
            filename,
            status: DocumentStatus::Uploaded,
            progress: 0.0,
            message: None,
            error: None,
            metadata: DocumentMetadata {
                file_size,
                total_pages: summary.page_count,
                chunk_count: 0,
                average_chunk_length: 0.0,
                title: summary.title,
                author: summary.author,
                uploaded_at: Utc::now(),
                completed_at: None,
            },
        }
    }
}

/// Store holding one record per document id
pub struct StatusStore {
    records: RwLock<HashMap<String, DocumentRecord>>,
    path: Option<PathBuf>,
}

impl StatusStore {
    /// Purely in-memory store, used by tests and embedded callers
    pub fn in_memory() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            path: None,
        }
    }

    /// File-backed store; loads existing records and rewrites the file
    /// after every mutation.
    pub fn open(path: PathBuf) -> Result<Self> {
        let records = if path.exists() {
            serde_json::from_slice(&std::fs::read(&path)?)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            records: RwLock::new(records),
            path: Some(path),
        })
    }

    pub fn insert(&self, record: DocumentRecord) {
        let mut records = self.records.write().expect("status store poisoned");
        records.insert(record.document_id.clone(), record);
        self.persist(&records);
    }

    pub fn get(&self, document_id: &str) -> Option<DocumentRecord> {
        self.records
            .read()
            .expect("status store poisoned")
            .get(document_id)
            .cloned()
    }

    pub fn list(&self) -> Vec<DocumentRecord> {
        let mut records: Vec<DocumentRecord> = self
            .records
            .read()
            .expect("status store poisoned")
            .values()
            .cloned()
            .collect();
        records.sort_by(|a, b| a.metadata.uploaded_at.cmp(&b.metadata.uploaded_at));
        records
    }

    pub fn remove(&self, document_id: &str) {
        let mut records = self.records.write().expect("status store poisoned");
        records.remove(document_id);
        self.persist(&records);
    }

    pub fn set_status(&self, document_id: &str, status: DocumentStatus) {
        self.update(document_id, |record| record.status = status);
    }

    pub fn set_error(&self, document_id: &str, error: &str) {
        self.update(document_id, |record| {
            record.status = DocumentStatus::Error;
            record.error = Some(error.to_string());
        });
    }

    pub fn set_progress(&self, document_id: &str, message: &str, fraction: f32) {
        self.update(document_id, |record| {
            record.progress = fraction.clamp(0.0, 1.0);
            record.message = Some(message.to_string());
        });
    }

    /// Apply a mutation to a record if it exists
    pub fn update<F>(&self, document_id: &str, mutate: F)
    where
        F: FnOnce(&mut DocumentRecord),
    {
        let mut records = self.records.write().expect("status store poisoned");
        if let Some(record) = records.get_mut(document_id) {
            mutate(record);
            self.persist(&records);
        }
    }

    // Status records are advisory; a failed write is logged, not fatal.
    fn persist(&self, records: &HashMap<String, DocumentRecord>) {
        let Some(path) = &self.path else {
            return;
        };
        let write = || -> Result<()> {
            let tmp = path.with_extension("json.tmp");
            std::fs::write(&tmp, serde_json::to_vec_pretty(records)?)?;
            std::fs::rename(&tmp, path)?;
            Ok(())
        };
        if let Err(e) = write() {
            warn!("Failed to persist status records: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(id: &str) -> DocumentRecord {
        DocumentRecord::new(
            id.to_string(),
            "file.pdf".to_string(),
            1234,
            PdfSummary {
                page_count: 2,
                title: Some("Title".to_string()),
                author: None,
            },
        )
    }

    #[test]
    fn test_insert_get_remove() {
        let store = StatusStore::in_memory();
        store.insert(sample_record("a"));

        let record = store.get("a").unwrap();
        assert_eq!(record.status, DocumentStatus::Uploaded);
        assert_eq!(record.metadata.total_pages, 2);

        store.remove("a");
        assert!(store.get("a").is_none());
    }

    #[test]
    fn test_set_error_is_terminal_with_reason() {
        let store = StatusStore::in_memory();
        store.insert(sample_record("a"));
        store.set_error("a", "extraction exploded");

        let record = store.get("a").unwrap();
        assert_eq!(record.status, DocumentStatus::Error);
        assert_eq!(record.error.as_deref(), Some("extraction exploded"));
    }

    #[test]
    fn test_progress_is_clamped() {
        let store = StatusStore::in_memory();
        store.insert(sample_record("a"));
        store.set_progress("a", "Encoding", 1.4);

        assert!((store.get("a").unwrap().progress - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_update_on_missing_record_is_a_noop() {
        let store = StatusStore::in_memory();
        store.set_progress("ghost", "noop", 0.5);
        assert!(store.get("ghost").is_none());
    }

    #[test]
    fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        {
            let store = StatusStore::open(path.clone()).unwrap();
            store.insert(sample_record("persisted"));
        }

        let reopened = StatusStore::open(path).unwrap();
        let record = reopened.get("persisted").unwrap();
        assert_eq!(record.filename, "file.pdf");
    }
}
