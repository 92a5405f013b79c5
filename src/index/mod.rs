//! Per-document vector index
//!
//! Each document gets a flat L2 index over its chunk embeddings, persisted
//! beside the ordered chunk sequence. Invariant: vector i always corresponds
//! to chunk i, and neither artifact exists without the other.

use crate::chunk::{DocumentChunk, SIMILARITY_KEY};
use crate::embed::{embed_one, Embedder};
use crate::error::{Error, Result};
use crate::progress::ProgressSink;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Flat (exhaustive) similarity structure over fixed-dimension vectors.
///
/// Distances are squared L2, matching FAISS `IndexFlatL2` semantics; callers
/// needing a bounded similarity score must convert.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlatIndex {
    pub dimension: usize,
    pub vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn add(&mut self, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::Embedding(format!(
                "Vector dimension {} does not match index dimension {}",
                vector.len(),
                self.dimension
            )));
        }
        self.vectors.push(vector);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Exhaustive nearest-neighbor scan returning `(index, squared distance)`
    /// pairs for the `k` closest vectors, nearest first.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Owns DocumentIndex persistence: embedding chunks, building the flat
/// index, and serving nearest-neighbor queries per document id.
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    index_dir: PathBuf,
    batch_size: usize,
}

impl VectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>, index_dir: PathBuf, batch_size: usize) -> Result<Self> {
        std::fs::create_dir_all(&index_dir)?;
        Ok(Self {
            embedder,
            index_dir,
            batch_size,
        })
    }

    fn index_path(&self, document_id: &str) -> PathBuf {
        self.index_dir.join(format!("{}.index.json", document_id))
    }

    fn chunks_path(&self, document_id: &str) -> PathBuf {
        self.index_dir.join(format!("{}.chunks.json", document_id))
    }

    /// Whether a persisted index exists for this document
    pub fn exists(&self, document_id: &str) -> bool {
        self.index_path(document_id).exists() && self.chunks_path(document_id).exists()
    }

    /// Embed `chunks` in batches, build the index, and persist both
    /// artifacts. Replaces any previous index for this document wholesale.
    /// On failure every partial artifact is removed.
    pub async fn add_chunks(
        &self,
        document_id: &str,
        chunks: &[DocumentChunk],
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        if chunks.is_empty() {
            return Err(Error::Validation(
                "No chunks provided for indexing".to_string(),
            ));
        }

        match self.build_and_persist(document_id, chunks, progress).await {
            Ok(()) => {
                info!(
                    "Successfully indexed {} chunks for document {}",
                    chunks.len(),
                    document_id
                );
                Ok(())
            }
            Err(e) => {
                warn!("Error indexing chunks for document {}: {}", document_id, e);
                self.cleanup_index_files(document_id);
                Err(e)
            }
        }
    }

    async fn build_and_persist(
        &self,
        document_id: &str,
        chunks: &[DocumentChunk],
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        progress.report("Preparing chunks for indexing...", 0.1);

        let total = chunks.len();
        let mut index = FlatIndex::new(self.embedder.dimension());

        // Batches run strictly in order so vector i stays aligned with
        // chunk i.
        let mut done = 0usize;
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed(texts).await?;
            if embeddings.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "Mismatch between embeddings ({}) and chunks ({})",
                    embeddings.len(),
                    batch.len()
                )));
            }
            for vector in embeddings {
                index.add(vector)?;
            }

            done += batch.len();
            progress.report(
                &format!("Encoding chunks ({}/{})...", done, total),
                0.1 + 0.6 * (done as f32 / total as f32),
            );
        }

        progress.report("Creating index...", 0.8);
        debug_assert_eq!(index.len(), chunks.len());

        progress.report("Saving index and metadata...", 0.9);
        self.persist(document_id, &index, chunks)?;

        progress.report("Indexing completed", 1.0);
        Ok(())
    }

    /// Write both artifacts via temp files and rename them into place, so a
    /// crash never leaves a vector structure without its chunk sequence.
    fn persist(&self, document_id: &str, index: &FlatIndex, chunks: &[DocumentChunk]) -> Result<()> {
        let index_path = self.index_path(document_id);
        let chunks_path = self.chunks_path(document_id);
        let index_tmp = index_path.with_extension("json.tmp");
        let chunks_tmp = chunks_path.with_extension("json.tmp");

        std::fs::write(&index_tmp, serde_json::to_vec(index)?)?;
        std::fs::write(&chunks_tmp, serde_json::to_vec(chunks)?)?;
        std::fs::rename(&index_tmp, &index_path)?;
        std::fs::rename(&chunks_tmp, &chunks_path)?;
        Ok(())
    }

    /// Find the `k` chunks nearest to `query`, nearest first, with the
    /// squared L2 distance attached under the similarity metadata key.
    pub async fn search(
        &self,
        document_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<DocumentChunk>> {
        if query.trim().is_empty() {
            return Err(Error::Validation("Empty query provided".to_string()));
        }
        if k == 0 {
            return Err(Error::Validation("k must be positive".to_string()));
        }
        if !self.exists(document_id) {
            return Err(Error::NotFound(format!(
                "No index found for document {}",
                document_id
            )));
        }

        let index: FlatIndex =
            serde_json::from_slice(&std::fs::read(self.index_path(document_id))?)?;
        let chunks: Vec<DocumentChunk> =
            serde_json::from_slice(&std::fs::read(self.chunks_path(document_id))?)?;

        let query_vector = embed_one(self.embedder.as_ref(), query).await?;

        let hits = index.search(&query_vector, k.min(chunks.len()));
        debug!(
            "Search over document {} returned {} of {} chunks",
            document_id,
            hits.len(),
            chunks.len()
        );

        let mut results = Vec::with_capacity(hits.len());
        for (idx, distance) in hits {
            if let Some(chunk) = chunks.get(idx) {
                let mut chunk = chunk.clone();
                chunk
                    .metadata
                    .insert(SIMILARITY_KEY.to_string(), Value::from(f64::from(distance)));
                results.push(chunk);
            }
        }
        Ok(results)
    }

    /// Number of chunks indexed for a document, if an index exists
    pub fn chunk_count(&self, document_id: &str) -> Result<Option<usize>> {
        if !self.exists(document_id) {
            return Ok(None);
        }
        let chunks: Vec<DocumentChunk> =
            serde_json::from_slice(&std::fs::read(self.chunks_path(document_id))?)?;
        Ok(Some(chunks.len()))
    }

    /// Remove both persisted artifacts; missing files are not an error.
    /// Returns false when an existing artifact could not be removed.
    pub fn delete_document(&self, document_id: &str) -> bool {
        self.cleanup_index_files(document_id)
    }

    fn cleanup_index_files(&self, document_id: &str) -> bool {
        let index_path = self.index_path(document_id);
        let chunks_path = self.chunks_path(document_id);
        let mut ok = true;
        for path in [
            index_path.with_extension("json.tmp"),
            chunks_path.with_extension("json.tmp"),
            index_path,
            chunks_path,
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!("Error cleaning up index file {:?}: {}", path, e);
                    ok = false;
                }
            }
        }
        ok
    }
}
