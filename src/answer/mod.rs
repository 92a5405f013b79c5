//! Question answering over indexed documents
//!
//! Retrieves ranked chunks for a question, assembles a token-budgeted
//! prompt, invokes the generation model, and scores the answer. The engine
//! owns no persisted state; it reads the vector index and produces a
//! transient [`Answer`].

use crate::chunk::DocumentChunk;
use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::generate::Generator;
use crate::index::VectorIndex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum question length in characters
pub const MAX_QUESTION_CHARS: usize = 500;

/// Permitted context-window range
pub const MIN_CONTEXT_WINDOW: usize = 512;
pub const MAX_CONTEXT_WINDOW: usize = 8192;

const PROMPT_TEMPLATE_HEAD: &str = "Given the following context, please answer the question. \
Use only the information provided in the context.\n\
If you cannot find the answer in the context, say \
\"I cannot find the answer in the provided context.\"";

/// Render the fixed prompt template with context and question filled in
pub fn render_prompt(context: &str, question: &str) -> String {
    format!(
        "{}\n\nContext:\n{}\n\nQuestion: {}\n\nAnswer:",
        PROMPT_TEMPLATE_HEAD, context, question
    )
}

/// A question against one document. Pure input, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub question: String,
    pub document_id: String,
    pub context_window: usize,
}

impl Query {
    pub fn validate(&self) -> Result<()> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(Error::Validation("Question cannot be empty".to_string()));
        }
        if question.chars().count() > MAX_QUESTION_CHARS {
            return Err(Error::Validation(format!(
                "Question exceeds {} characters",
                MAX_QUESTION_CHARS
            )));
        }
        if !(MIN_CONTEXT_WINDOW..=MAX_CONTEXT_WINDOW).contains(&self.context_window) {
            return Err(Error::Validation(format!(
                "Context window must be between {} and {}",
                MIN_CONTEXT_WINDOW, MAX_CONTEXT_WINDOW
            )));
        }
        Ok(())
    }
}

/// Token and provenance accounting for an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerMetadata {
    pub model: String,
    pub chunks_used: usize,
    pub total_tokens: usize,
    pub context_window: usize,
    pub avg_similarity_score: f64,
}

/// A generated answer with the context chunks that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub context: Vec<DocumentChunk>,
    pub confidence: f32,
    pub metadata: AnswerMetadata,
}

/// Retrieval + prompt assembly + generation
pub struct AnswerEngine {
    index: Arc<VectorIndex>,
    generator: Arc<dyn Generator>,
    config: GenerationConfig,
}

impl AnswerEngine {
    pub fn new(
        index: Arc<VectorIndex>,
        generator: Arc<dyn Generator>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            index,
            generator,
            config,
        }
    }

    /// Answer a question against one document.
    ///
    /// Candidate chunks are taken in ranked order while their cumulative
    /// token cost fits the context budget; selection stops at the first
    /// chunk that would overflow, so later candidates are never considered
    /// even when individually smaller. The same selected list feeds both
    /// the prompt and the confidence score.
    pub async fn answer(&self, query: &Query) -> Result<Answer> {
        query.validate()?;

        let max_input = query.context_window.min(self.config.max_input_tokens);

        let candidates = self
            .index
            .search(&query.document_id, &query.question, self.config.retrieval_k)
            .await?;

        let template_tokens = self
            .generator
            .count_tokens(&render_prompt("", &query.question));
        let available = max_input
            .saturating_sub(template_tokens)
            .saturating_sub(self.config.answer_reserve_tokens);

        let mut selected: Vec<DocumentChunk> = Vec::new();
        let mut total_tokens = 0usize;
        for chunk in candidates {
            let cost = self.generator.count_tokens(&chunk.text);
            if total_tokens + cost > available {
                break;
            }
            total_tokens += cost;
            selected.push(chunk);
        }
        debug!(
            "Selected {} chunks ({} tokens) within a budget of {}",
            selected.len(),
            total_tokens,
            available
        );

        let context = selected
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = render_prompt(&context, &query.question);

        let generated = match self
            .generator
            .generate(&prompt, self.config.max_output_tokens)
            .await
        {
            Ok(text) => text,
            Err(Error::ResourceExhausted(reason)) => {
                warn!("Generation ran out of capacity, reloading model: {}", reason);
                self.generator.reload().await?;
                return Err(Error::ResourceExhausted(
                    "Insufficient generation capacity. Please try again with a smaller context window."
                        .to_string(),
                ));
            }
            Err(e) => return Err(e),
        };

        // Some models echo the template; keep only what follows the final
        // answer marker.
        let answer = generated
            .rsplit("Answer:")
            .next()
            .unwrap_or(&generated)
            .trim()
            .to_string();

        let chunks_used = selected.len();
        let avg_similarity = if chunks_used > 0 {
            selected
                .iter()
                .filter_map(|c| c.similarity_score())
                .sum::<f64>()
                / chunks_used as f64
        } else {
            0.0
        };
        let coverage = chunks_used as f64 / self.config.retrieval_k as f64;
        let confidence = (coverage * (1.0 - avg_similarity / 2.0)).clamp(0.0, 1.0) as f32;

        Ok(Answer {
            answer,
            context: selected,
            confidence,
            metadata: AnswerMetadata {
                model: self.generator.model_name().to_string(),
                chunks_used,
                total_tokens,
                context_window: max_input,
                avg_similarity_score: avg_similarity,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::Embedder;
    use crate::progress::NullSink;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let sum: u32 = t.bytes().map(u32::from).sum();
                    vec![
                        t.chars().count() as f32,
                        (sum % 97) as f32,
                        t.split_whitespace().count() as f32,
                    ]
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    /// Counts whitespace-separated words as tokens; answers with a fixed
    /// completion unless told to exhaust resources.
    struct MockGenerator {
        exhaust: bool,
        reloads: AtomicUsize,
    }

    impl MockGenerator {
        fn ok() -> Self {
            Self {
                exhaust: false,
                reloads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Generator for MockGenerator {
        async fn generate(&self, _prompt: &str, _max_tokens: usize) -> Result<String> {
            if self.exhaust {
                return Err(Error::ResourceExhausted("mock oom".to_string()));
            }
            Ok("echoed template Answer: forty-two".to_string())
        }

        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }

        async fn reload(&self) -> Result<()> {
            self.reloads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn model_name(&self) -> &str {
            "mock-model"
        }
    }

    fn make_chunk(ordinal: usize, text: &str) -> DocumentChunk {
        DocumentChunk {
            chunk_id: format!("0-{}", ordinal),
            text: text.to_string(),
            page_number: 0,
            metadata: HashMap::new(),
        }
    }

    async fn engine_with_chunks(
        dir: &std::path::Path,
        texts: &[&str],
        generator: Arc<MockGenerator>,
    ) -> AnswerEngine {
        let index = Arc::new(
            VectorIndex::new(Arc::new(StubEmbedder), dir.to_path_buf(), 32).unwrap(),
        );
        let chunks: Vec<DocumentChunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| make_chunk(i, t))
            .collect();
        index.add_chunks("doc", &chunks, &NullSink).await.unwrap();
        AnswerEngine::new(index, generator, GenerationConfig::default())
    }

    fn query(question: &str, context_window: usize) -> Query {
        Query {
            question: question.to_string(),
            document_id: "doc".to_string(),
            context_window,
        }
    }

    #[test]
    fn test_query_validation() {
        assert!(query("fine question", 4096).validate().is_ok());
        assert!(matches!(
            query("   ", 4096).validate().unwrap_err(),
            Error::Validation(_)
        ));
        assert!(matches!(
            query(&"q".repeat(501), 4096).validate().unwrap_err(),
            Error::Validation(_)
        ));
        assert!(matches!(
            query("ok", 100).validate().unwrap_err(),
            Error::Validation(_)
        ));
        assert!(matches!(
            query("ok", 10_000).validate().unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_answer_strips_template_echo() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(MockGenerator::ok());
        let engine =
            engine_with_chunks(dir.path(), &["The sky is blue today."], generator).await;

        let answer = engine.answer(&query("What color is the sky?", 4096)).await.unwrap();
        assert_eq!(answer.answer, "forty-two");
        assert_eq!(answer.metadata.model, "mock-model");
        assert_eq!(answer.metadata.chunks_used, 1);
        assert!(answer.metadata.total_tokens > 0);
    }

    #[tokio::test]
    async fn test_unknown_document_propagates_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(
            VectorIndex::new(Arc::new(StubEmbedder), dir.path().to_path_buf(), 32).unwrap(),
        );
        let engine = AnswerEngine::new(
            index,
            Arc::new(MockGenerator::ok()),
            GenerationConfig::default(),
        );

        let err = engine.answer(&query("anything", 4096)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_oversized_first_chunk_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(MockGenerator::ok());

        // 600 tokens cannot fit whatever budget a 512-token window leaves
        // after the template and the answer reserve.
        let big = "filler ".repeat(600);
        let engine = engine_with_chunks(dir.path(), &[big.trim()], Arc::clone(&generator)).await;

        let answer = engine
            .answer(&query("What is the filler about?", 512))
            .await
            .unwrap();

        assert_eq!(answer.metadata.chunks_used, 0);
        assert!(answer.context.is_empty());
        assert_eq!(answer.metadata.total_tokens, 0);
        assert_eq!(answer.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_selection_is_a_strict_prefix_of_the_ranking() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(MockGenerator::ok());

        // The nearest chunk (400 one-char words, embedded close to the
        // query) overflows the budget; the smaller chunk ranked after it
        // must not be pulled in around it.
        let big = "a ".repeat(400);
        let engine = engine_with_chunks(
            dir.path(),
            &[big.trim(), "tiny chunk"],
            Arc::clone(&generator),
        )
        .await;

        let question = "a ".repeat(250);
        let answer = engine.answer(&query(question.trim(), 512)).await.unwrap();
        assert_eq!(answer.metadata.chunks_used, 0);
        assert!(answer.context.is_empty());
    }

    #[test]
    fn test_budget_accounts_for_template_and_reserve() {
        let generator = MockGenerator::ok();
        let question = "What is in the report?";
        let template_tokens = generator.count_tokens(&render_prompt("", question));

        // A 512-token window must leave room for the template and the
        // answer reserve before any chunk is admitted.
        let available = 512 - template_tokens - 100;
        assert!(available < 512 - template_tokens);
        assert!(available > 0);
    }

    #[tokio::test]
    async fn test_exact_match_yields_high_confidence() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(MockGenerator::ok());
        let engine = engine_with_chunks(
            dir.path(),
            &["Quarterly revenue rose sharply."],
            Arc::clone(&generator),
        )
        .await;

        // Identical query embeds to distance zero; one of five candidate
        // slots used gives coverage 1/5 and no distance penalty.
        let answer = engine
            .answer(&query("Quarterly revenue rose sharply.", 4096))
            .await
            .unwrap();
        assert_eq!(answer.metadata.chunks_used, 1);
        assert!((answer.confidence - 0.2).abs() < 1e-6);
        assert_eq!(answer.metadata.avg_similarity_score, 0.0);
    }

    #[tokio::test]
    async fn test_oom_reloads_once_and_fails_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(MockGenerator {
            exhaust: true,
            reloads: AtomicUsize::new(0),
        });
        let engine = engine_with_chunks(
            dir.path(),
            &["Context chunk for the failing path."],
            Arc::clone(&generator),
        )
        .await;

        let err = engine.answer(&query("will this fail?", 4096)).await.unwrap_err();
        assert!(matches!(err, Error::ResourceExhausted(_)));
        assert_eq!(generator.reloads.load(Ordering::SeqCst), 1);
    }
}
