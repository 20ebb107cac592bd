//! Vector storage abstraction.
//!
//! The [`VectorStore`] trait persists chunk text, page metadata, and the
//! embedding vector of every chunk, and answers project-scoped similarity
//! queries. Backends:
//!
//! - `SqliteStore` (app crate): the persistent store
//! - [`memory::InMemoryStore`]: for tests and embedding in other tools
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Ranking contract
//!
//! [`search`](VectorStore::search) scores every chunk of the project with
//! [`cosine_similarity`](crate::embedding::cosine_similarity) (no index) and
//! returns at most `top_k` hits in descending score order. Candidates are
//! visited in `(document_id, chunk_index)` order and sorted stably, so equal
//! scores always come back in that order.

pub mod memory;

use async_trait::async_trait;

use crate::error::{RagError, Result};
use crate::models::{NewChunk, ScoredChunk, TextChunk};

/// Abstract chunk + vector store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`put`](VectorStore::put) | Insert one chunk; never overwrites |
/// | [`put_batch`](VectorStore::put_batch) | Insert all chunks of a document atomically |
/// | [`search`](VectorStore::search) | Project-scoped cosine search |
/// | [`chunk_count`](VectorStore::chunk_count) | Number of chunks stored for a document |
/// | [`document_chunks`](VectorStore::document_chunks) | Chunks of a document, in index order |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persist one chunk and its vector, returning the new chunk id.
    ///
    /// Fails with [`RagError::DuplicateChunk`] if `(document_id, chunk_index)`
    /// already exists and with [`RagError::NotFound`] if the document is unknown.
    async fn put(&self, document_id: &str, chunk: &NewChunk) -> Result<String>;

    /// Persist every chunk of a document in one transaction.
    ///
    /// Either all chunks are stored or none are.
    async fn put_batch(&self, document_id: &str, chunks: &[NewChunk]) -> Result<Vec<String>>;

    /// Rank the chunks of `project_id` against `query_vector`.
    async fn search(
        &self,
        project_id: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>>;

    async fn chunk_count(&self, document_id: &str) -> Result<usize>;

    async fn document_chunks(&self, document_id: &str) -> Result<Vec<TextChunk>>;
}

/// Reject chunks that could never be searched meaningfully.
pub fn validate_chunk(chunk: &NewChunk) -> Result<()> {
    if chunk.vector.is_empty() {
        return Err(RagError::InvalidInput(format!(
            "chunk {} has an empty vector",
            chunk.chunk_index
        )));
    }
    if chunk.chunk_index < 0 {
        return Err(RagError::InvalidInput(format!(
            "chunk index must be >= 0, got {}",
            chunk.chunk_index
        )));
    }
    if chunk.page_number < 1 {
        return Err(RagError::InvalidInput(format!(
            "page number must be >= 1, got {}",
            chunk.page_number
        )));
    }
    Ok(())
}

/// Sort candidates by descending score and keep the best `top_k`.
///
/// The sort is stable; `NaN` scores rank below everything else.
pub fn rank(mut candidates: Vec<ScoredChunk>, top_k: usize) -> Vec<ScoredChunk> {
    fn key(score: f32) -> f32 {
        if score.is_nan() {
            f32::NEG_INFINITY
        } else {
            score
        }
    }

    candidates.sort_by(|a, b| key(b.score).total_cmp(&key(a.score)));
    candidates.truncate(top_k);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            score,
            chunk_id: id.to_string(),
            document_id: "d".to_string(),
            text: String::new(),
            page_number: 1,
            chunk_index: 0,
            vector: Vec::new(),
        }
    }

    fn ids(hits: &[ScoredChunk]) -> Vec<&str> {
        hits.iter().map(|h| h.chunk_id.as_str()).collect()
    }

    #[test]
    fn test_rank_descending_and_truncated() {
        let ranked = rank(
            vec![hit("a", 0.1), hit("b", 0.9), hit("c", 0.5), hit("d", -0.2)],
            3,
        );
        assert_eq!(ids(&ranked), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let ranked = rank(vec![hit("a", 0.5), hit("b", 0.7), hit("c", 0.5)], 10);
        assert_eq!(ids(&ranked), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_rank_nan_sorts_last() {
        let ranked = rank(vec![hit("nan", f32::NAN), hit("low", -1.0)], 2);
        assert_eq!(ids(&ranked), vec!["low", "nan"]);
    }

    #[test]
    fn test_validate_chunk() {
        let ok = NewChunk {
            text: "x".into(),
            page_number: 1,
            chunk_index: 0,
            vector: vec![1.0],
        };
        assert!(validate_chunk(&ok).is_ok());
        let empty = NewChunk {
            vector: vec![],
            ..ok.clone()
        };
        assert!(matches!(
            validate_chunk(&empty),
            Err(RagError::InvalidInput(_))
        ));
        let page_zero = NewChunk {
            page_number: 0,
            ..ok
        };
        assert!(validate_chunk(&page_zero).is_err());
    }
}
