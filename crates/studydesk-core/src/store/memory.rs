//! In-memory [`VectorStore`] implementation for tests and embedding.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! Documents must be registered with their owning project before chunks can
//! be stored for them, mirroring the foreign keys of the SQLite schema.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::embedding::cosine_similarity;
use crate::error::{RagError, Result};
use crate::models::{NewChunk, ScoredChunk, TextChunk};

use super::{rank, validate_chunk, VectorStore};

#[derive(Default)]
struct Inner {
    /// document_id → project_id
    documents: HashMap<String, String>,
    chunks: Vec<TextChunk>,
}

/// In-memory chunk store.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Record that `document_id` belongs to `project_id`.
    pub fn register_document(&self, document_id: &str, project_id: &str) -> Result<()> {
        self.write()?
            .documents
            .insert(document_id.to_string(), project_id.to_string());
        Ok(())
    }

    /// Forget a document and every chunk it owns. Returns the number of chunks removed.
    pub fn remove_document(&self, document_id: &str) -> Result<usize> {
        let mut inner = self.write()?;
        inner.documents.remove(document_id);
        let before = inner.chunks.len();
        inner.chunks.retain(|c| c.document_id != document_id);
        Ok(before - inner.chunks.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| RagError::Storage("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| RagError::Storage("in-memory store lock poisoned".to_string()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_insert(inner: &Inner, document_id: &str, chunk: &NewChunk) -> Result<()> {
    validate_chunk(chunk)?;
    if !inner.documents.contains_key(document_id) {
        return Err(RagError::not_found("document", document_id));
    }
    let taken = inner
        .chunks
        .iter()
        .any(|c| c.document_id == document_id && c.chunk_index == chunk.chunk_index);
    if taken {
        return Err(RagError::DuplicateChunk {
            document_id: document_id.to_string(),
            chunk_index: chunk.chunk_index,
        });
    }
    Ok(())
}

fn to_stored(document_id: &str, chunk: &NewChunk) -> TextChunk {
    TextChunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        text: chunk.text.clone(),
        page_number: chunk.page_number,
        chunk_index: chunk.chunk_index,
        vector: chunk.vector.clone(),
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn put(&self, document_id: &str, chunk: &NewChunk) -> Result<String> {
        let mut inner = self.write()?;
        check_insert(&inner, document_id, chunk)?;
        let stored = to_stored(document_id, chunk);
        let id = stored.id.clone();
        inner.chunks.push(stored);
        Ok(id)
    }

    async fn put_batch(&self, document_id: &str, chunks: &[NewChunk]) -> Result<Vec<String>> {
        let mut inner = self.write()?;

        // Validate everything up front so a failure leaves the store untouched.
        let mut seen = std::collections::HashSet::new();
        for chunk in chunks {
            check_insert(&inner, document_id, chunk)?;
            if !seen.insert(chunk.chunk_index) {
                return Err(RagError::DuplicateChunk {
                    document_id: document_id.to_string(),
                    chunk_index: chunk.chunk_index,
                });
            }
        }

        let stored: Vec<TextChunk> = chunks.iter().map(|c| to_stored(document_id, c)).collect();
        let ids = stored.iter().map(|c| c.id.clone()).collect();
        inner.chunks.extend(stored);
        Ok(ids)
    }

    async fn search(
        &self,
        project_id: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let inner = self.read()?;

        let mut in_project: Vec<&TextChunk> = inner
            .chunks
            .iter()
            .filter(|c| {
                inner
                    .documents
                    .get(&c.document_id)
                    .is_some_and(|p| p == project_id)
            })
            .collect();
        in_project.sort_by(|a, b| {
            a.document_id
                .cmp(&b.document_id)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });

        let candidates = in_project
            .into_iter()
            .map(|c| ScoredChunk {
                score: cosine_similarity(query_vector, &c.vector),
                chunk_id: c.id.clone(),
                document_id: c.document_id.clone(),
                text: c.text.clone(),
                page_number: c.page_number,
                chunk_index: c.chunk_index,
                vector: c.vector.clone(),
            })
            .collect();

        Ok(rank(candidates, top_k))
    }

    async fn chunk_count(&self, document_id: &str) -> Result<usize> {
        Ok(self
            .read()?
            .chunks
            .iter()
            .filter(|c| c.document_id == document_id)
            .count())
    }

    async fn document_chunks(&self, document_id: &str) -> Result<Vec<TextChunk>> {
        let mut chunks: Vec<TextChunk> = self
            .read()?
            .chunks
            .iter()
            .filter(|c| c.document_id == document_id)
            .cloned()
            .collect();
        chunks.sort_by_key(|c| c.chunk_index);
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: i64, vector: Vec<f32>) -> NewChunk {
        NewChunk {
            text: format!("chunk {}", index),
            page_number: 1,
            chunk_index: index,
            vector,
        }
    }

    #[tokio::test]
    async fn test_two_chunk_scenario() {
        let store = InMemoryStore::new();
        store.register_document("doc", "p").unwrap();
        store.put("doc", &chunk(0, vec![1.0, 0.0])).await.unwrap();
        store.put("doc", &chunk(1, vec![0.0, 1.0])).await.unwrap();

        let hits = store.search("p", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_index, 0);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert_eq!(hits[1].chunk_index, 1);
        assert!(hits[1].score.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_put_never_overwrites() {
        let store = InMemoryStore::new();
        store.register_document("doc", "p").unwrap();
        store.put("doc", &chunk(0, vec![1.0])).await.unwrap();
        let err = store.put("doc", &chunk(0, vec![2.0])).await.unwrap_err();
        assert!(matches!(err, RagError::DuplicateChunk { chunk_index: 0, .. }));
        let stored = store.document_chunks("doc").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].vector, vec![1.0]);
    }

    #[tokio::test]
    async fn test_put_unknown_document() {
        let store = InMemoryStore::new();
        let err = store.put("ghost", &chunk(0, vec![1.0])).await.unwrap_err();
        assert!(matches!(err, RagError::NotFound { kind: "document", .. }));
    }

    #[tokio::test]
    async fn test_put_batch_is_all_or_nothing() {
        let store = InMemoryStore::new();
        store.register_document("doc", "p").unwrap();
        let batch = vec![chunk(0, vec![1.0]), chunk(1, vec![1.0]), chunk(1, vec![1.0])];
        assert!(store.put_batch("doc", &batch).await.is_err());
        assert_eq!(store.chunk_count("doc").await.unwrap(), 0);

        let ids = store.put_batch("doc", &batch[..2]).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(store.chunk_count("doc").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_search_is_project_scoped() {
        let store = InMemoryStore::new();
        store.register_document("mine", "p1").unwrap();
        store.register_document("theirs", "p2").unwrap();
        store.put("mine", &chunk(0, vec![0.0, 1.0])).await.unwrap();
        store.put("theirs", &chunk(0, vec![1.0, 0.0])).await.unwrap();

        let hits = store.search("p1", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_id, "mine");
        assert!(store.search("p3", &[1.0, 0.0], 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_document_drops_chunks() {
        let store = InMemoryStore::new();
        store.register_document("doc", "p").unwrap();
        store
            .put_batch("doc", &[chunk(0, vec![1.0]), chunk(1, vec![1.0])])
            .await
            .unwrap();
        assert_eq!(store.remove_document("doc").unwrap(), 2);
        assert!(store.search("p", &[1.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_top_k() {
        let store = InMemoryStore::new();
        store.register_document("doc", "p").unwrap();
        store.put("doc", &chunk(0, vec![1.0])).await.unwrap();
        assert!(store.search("p", &[1.0], 0).await.unwrap().is_empty());
    }
}
