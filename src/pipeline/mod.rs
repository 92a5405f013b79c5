//! Document ingestion pipeline
//!
//! Owns the per-document lifecycle: upload validation, page-by-page text
//! extraction, chunking, and indexing with progress and bounded retries.
//! State machine per document: Uploaded -> Processing -> Completed | Error.
//! Error is terminal and deletes every artifact for the document.

mod store;

pub use store::*;

use crate::chunk::chunk_page;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::{self, PdfSummary};
use crate::index::VectorIndex;
use crate::progress::{NullSink, ProgressSink, ScaledSink};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Orchestrates validation, extraction, chunking, and indexing
pub struct DocumentPipeline {
    config: Config,
    store: Arc<StatusStore>,
    index: Arc<VectorIndex>,
    upload_dir: PathBuf,
    // Serializes processing per document id; concurrent documents proceed
    // independently.
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl DocumentPipeline {
    pub fn new(config: Config, store: Arc<StatusStore>, index: Arc<VectorIndex>) -> Result<Self> {
        let upload_dir = config.upload_dir();
        std::fs::create_dir_all(&upload_dir)?;
        Ok(Self {
            config,
            store,
            index,
            upload_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    fn file_path(&self, document_id: &str) -> PathBuf {
        self.upload_dir.join(format!("{}.pdf", document_id))
    }

    fn lock_for(&self, document_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("lock map poisoned");
        locks
            .entry(document_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Persist an uploaded file and validate it before acceptance.
    ///
    /// Validation failures remove the just-written file and never create a
    /// status record, so a rejected upload leaves no trace.
    pub async fn save_document(&self, bytes: &[u8], filename: &str) -> Result<String> {
        let document_id = Uuid::new_v4().to_string();
        let file_path = self.file_path(&document_id);

        tokio::fs::write(&file_path, bytes).await?;

        let max_pages = self.config.max_pages;
        let owned = bytes.to_vec();
        let validated: Result<PdfSummary> =
            tokio::task::spawn_blocking(move || extract::validate_pdf(&owned, max_pages))
                .await
                .map_err(|e| Error::Processing(format!("Validation task failed: {}", e)))?;

        let summary = match validated {
            Ok(summary) => summary,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&file_path).await {
                    warn!("Failed to remove rejected upload: {}", remove_err);
                }
                return Err(e);
            }
        };

        let record = DocumentRecord::new(
            document_id.clone(),
            filename.to_string(),
            bytes.len() as u64,
            summary,
        );
        self.store.insert(record);

        info!("Document {} saved and validated successfully", document_id);
        Ok(document_id)
    }

    /// Spawn background processing for a document; errors are logged, and
    /// terminal failures are reflected in the status record.
    pub fn spawn_processing(self: &Arc<Self>, document_id: String) {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = pipeline.process_document(&document_id, &NullSink).await {
                error!("Background processing of {} failed: {}", document_id, e);
            }
        });
    }

    /// Run extraction, chunking, and indexing with bounded retries.
    ///
    /// Retryable faults repeat up to `max_retries` attempts with a fixed
    /// delay; exhaustion (or a non-retryable fault) is terminal and removes
    /// every artifact for the document, the status record included. The
    /// failure reason travels in the returned error.
    pub async fn process_document(
        &self,
        document_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let lock = self.lock_for(document_id);
        let _guard = lock.lock().await;

        if self.store.get(document_id).is_none() {
            return Err(Error::NotFound(format!(
                "Document not found: {}",
                document_id
            )));
        }
        self.store.set_status(document_id, DocumentStatus::Processing);

        let max_retries = self.config.processing.max_retries;
        let delay = Duration::from_secs(self.config.processing.retry_delay_secs);

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self.process_attempt(document_id, progress).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    error!(
                        "Error processing document {} (attempt {}/{}): {}",
                        document_id, attempt, max_retries, e
                    );
                    if attempt >= max_retries || !e.is_retryable() {
                        self.store.set_error(document_id, &e.to_string());
                        self.delete_artifacts(document_id).await;
                        return Err(Error::Processing(format!(
                            "Error processing document (attempt {}/{}): {}",
                            attempt, max_retries, e
                        )));
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn process_attempt(
        &self,
        document_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let sink = RecordSink {
            store: &self.store,
            document_id,
            forward: progress,
        };
        sink.report("Starting processing", 0.0);
        info!("Starting processing of document {}", document_id);

        let file_path = self.file_path(document_id);
        if !file_path.exists() {
            return Err(Error::Extraction(format!(
                "PDF file not found for document {}",
                document_id
            )));
        }
        let bytes = tokio::fs::read(&file_path).await?;

        // Extraction phase maps to [0.0, 0.3); 0.3 itself belongs to the
        // indexing band.
        let pages = tokio::task::spawn_blocking(move || extract::extract_pages(&bytes))
            .await
            .map_err(|e| Error::Processing(format!("Extraction task failed: {}", e)))??;

        let total_pages = pages.len().max(1);
        let mut chunks = Vec::new();
        for (i, page) in pages.iter().enumerate() {
            chunks.extend(chunk_page(&page.text, page.page_number, &self.config.chunk));
            sink.report(
                "Extracting text",
                0.3 * ((i + 1) as f32 / (total_pages + 1) as f32),
            );
        }

        if chunks.is_empty() {
            return Err(Error::EmptyDocument(
                "No text content could be extracted from the PDF".to_string(),
            ));
        }

        let total_chars: usize = chunks.iter().map(|c| c.text.chars().count()).sum();
        self.store.update(document_id, |record| {
            record.metadata.chunk_count = chunks.len();
            record.metadata.average_chunk_length = total_chars as f32 / chunks.len() as f32;
        });

        // Indexing phase rescales the index's own fraction into [0.3, 1.0).
        let indexing_sink = ScaledSink::new(&sink, 0.3, 0.7);
        self.index
            .add_chunks(document_id, &chunks, &indexing_sink)
            .await?;

        self.store.update(document_id, |record| {
            record.status = DocumentStatus::Completed;
            record.progress = 1.0;
            record.metadata.completed_at = Some(chrono::Utc::now());
        });
        info!(
            "Document {} processed successfully with {} chunks",
            document_id,
            chunks.len()
        );
        Ok(())
    }

    /// Current record for a document, if known
    pub fn get_status(&self, document_id: &str) -> Option<DocumentRecord> {
        self.store.get(document_id)
    }

    /// All known records, for listings
    pub fn list_documents(&self) -> Vec<DocumentRecord> {
        self.store.list()
    }

    /// Delete the raw file, the vector index, and the status record.
    ///
    /// Partial failures are tolerated and do not block clearing the record;
    /// the boolean reports overall success.
    pub async fn delete_document(&self, document_id: &str) -> bool {
        let mut ok = true;

        let file_path = self.file_path(document_id);
        if file_path.exists() {
            match tokio::fs::remove_file(&file_path).await {
                Ok(()) => info!("Deleted PDF file for document {}", document_id),
                Err(e) => {
                    error!("Error deleting file for document {}: {}", document_id, e);
                    ok = false;
                }
            }
        }

        if !self.index.delete_document(document_id) {
            ok = false;
        }
        self.store.remove(document_id);
        ok
    }

    /// Cleanup on terminal failure: raw file, index, and status record all
    /// go, so no partial state survives.
    async fn delete_artifacts(&self, document_id: &str) {
        let file_path = self.file_path(document_id);
        if file_path.exists() {
            if let Err(e) = tokio::fs::remove_file(&file_path).await {
                warn!("Error deleting file for document {}: {}", document_id, e);
            }
        }
        self.index.delete_document(document_id);
        self.store.remove(document_id);
    }
}

/// Sink that mirrors progress into the status record before forwarding.
struct RecordSink<'a> {
    store: &'a StatusStore,
    document_id: &'a str,
    forward: &'a dyn ProgressSink,
}

impl ProgressSink for RecordSink<'_> {
    fn report(&self, message: &str, fraction: f32) {
        self.store.set_progress(self.document_id, message, fraction);
        self.forward.report(message, fraction);
    }
}
