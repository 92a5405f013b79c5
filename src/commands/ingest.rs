//! Ingest command implementation

use crate::error::{Error, Result};
use crate::pipeline::{DocumentPipeline, DocumentRecord, DocumentStatus};
use crate::progress::BarSink;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Ingest a PDF file: upload, validate, and process it to completion
pub async fn cmd_ingest(pipeline: &Arc<DocumentPipeline>, path: &Path) -> Result<DocumentRecord> {
    info!("Ingesting {}", path.display());

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Validation(format!("Invalid file path: {}", path.display())))?;
    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return Err(Error::Validation(format!(
            "Only PDF files are supported: {}",
            filename
        )));
    }

    let bytes = tokio::fs::read(path).await?;
    let document_id = pipeline.save_document(&bytes, filename).await?;

    let bar = BarSink::new();
    let result = pipeline.process_document(&document_id, &bar).await;
    bar.finish();
    result?;

    pipeline
        .get_status(&document_id)
        .ok_or_else(|| Error::NotFound(format!("Document not found: {}", document_id)))
}

/// Print the result of an ingestion to console
pub fn print_ingest_result(record: &DocumentRecord) {
    match record.status {
        DocumentStatus::Completed => {
            println!("\n✓ Document ingested successfully");
        }
        _ => {
            println!("\n⚠ Document ingestion did not complete");
        }
    }
    println!("  ID: {}", record.document_id);
    println!("  File: {}", record.filename);
    println!("  Pages: {}", record.metadata.total_pages);
    println!("  Chunks: {}", record.metadata.chunk_count);
    if let Some(title) = &record.metadata.title {
        println!("  Title: {}", title);
    }
    println!("\nAsk a question with: docent ask {} \"...\"", record.document_id);
}
