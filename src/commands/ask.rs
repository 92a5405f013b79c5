//! Ask command implementation

use crate::answer::{Answer, AnswerEngine, Query};
use crate::error::Result;
use tracing::info;

/// Options for asking a question
#[derive(Debug, Clone)]
pub struct AskOptions {
    /// Token budget for prompt assembly
    pub context_window: usize,
    /// Include the retrieved context chunks in the printed output
    pub show_context: bool,
}

/// Answer a question against one ingested document
pub async fn cmd_ask(
    engine: &AnswerEngine,
    document_id: &str,
    question: &str,
    options: &AskOptions,
) -> Result<Answer> {
    info!("Answering question against document {}", document_id);

    let query = Query {
        question: question.to_string(),
        document_id: document_id.to_string(),
        context_window: options.context_window,
    };
    engine.answer(&query).await
}

/// Print an answer to console
pub fn print_answer(answer: &Answer, show_context: bool) {
    println!("\n{}\n", answer.answer);
    println!(
        "Confidence: {:.2}  (model: {}, chunks: {}, tokens: {}/{})",
        answer.confidence,
        answer.metadata.model,
        answer.metadata.chunks_used,
        answer.metadata.total_tokens,
        answer.metadata.context_window,
    );

    if show_context && !answer.context.is_empty() {
        println!("\nContext used:");
        for chunk in &answer.context {
            let score = chunk
                .similarity_score()
                .map(|s| format!("{:.4}", s))
                .unwrap_or_else(|| "-".to_string());
            println!("• [page {}, distance {}]", chunk.page_number + 1, score);
            println!("  {}", chunk.text);
        }
    }
}
