//! Status, list, and delete command implementations

use crate::error::{Error, Result};
use crate::pipeline::{DocumentPipeline, DocumentRecord, DocumentStatus};
use std::sync::Arc;
use tracing::info;

/// Get the status record of one document
pub fn cmd_status(pipeline: &Arc<DocumentPipeline>, document_id: &str) -> Result<DocumentRecord> {
    pipeline
        .get_status(document_id)
        .ok_or_else(|| Error::NotFound(format!("Document not found: {}", document_id)))
}

/// List all known documents, oldest first
pub fn cmd_list_documents(pipeline: &Arc<DocumentPipeline>) -> Vec<DocumentRecord> {
    pipeline.list_documents()
}

/// Delete a document with all of its artifacts
pub async fn cmd_delete(pipeline: &Arc<DocumentPipeline>, document_id: &str) -> Result<()> {
    if pipeline.get_status(document_id).is_none() {
        return Err(Error::NotFound(format!(
            "Document not found: {}",
            document_id
        )));
    }
    info!("Deleting document {}", document_id);
    if !pipeline.delete_document(document_id).await {
        return Err(Error::Processing(format!(
            "Some artifacts of document {} could not be removed",
            document_id
        )));
    }
    Ok(())
}

fn status_label(status: DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Uploaded => "uploaded",
        DocumentStatus::Processing => "processing",
        DocumentStatus::Completed => "completed",
        DocumentStatus::Error => "error",
    }
}

/// Print one document record to console
pub fn print_record(record: &DocumentRecord) {
    println!("\n📄 {}", record.filename);
    println!("  ID: {}", record.document_id);
    println!("  Status: {}", status_label(record.status));
    println!("  Progress: {:.0}%", record.progress * 100.0);
    if let Some(message) = &record.message {
        println!("  Step: {}", message);
    }
    if let Some(error) = &record.error {
        println!("  Error: {}", error);
    }
    println!("  Pages: {}", record.metadata.total_pages);
    println!("  Chunks: {}", record.metadata.chunk_count);
    if record.metadata.chunk_count > 0 {
        println!(
            "  Avg chunk length: {:.0} chars",
            record.metadata.average_chunk_length
        );
    }
    if let Some(title) = &record.metadata.title {
        println!("  Title: {}", title);
    }
    if let Some(author) = &record.metadata.author {
        println!("  Author: {}", author);
    }
    println!(
        "  Uploaded: {}",
        record.metadata.uploaded_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(completed) = record.metadata.completed_at {
        println!("  Completed: {}", completed.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}

/// Print the document listing to console
pub fn print_documents(records: &[DocumentRecord]) {
    println!("\n📚 Ingested Documents\n");

    if records.is_empty() {
        println!("No documents ingested. Use 'docent ingest <file.pdf>' to add one.");
        return;
    }

    for record in records {
        println!("• {} [{}]", record.filename, status_label(record.status));
        println!("  ID: {}", record.document_id);
        println!(
            "  Pages: {}, Chunks: {}",
            record.metadata.total_pages, record.metadata.chunk_count
        );
        if let Some(error) = &record.error {
            println!("  Error: {}", error);
        }
        println!();
    }
}
