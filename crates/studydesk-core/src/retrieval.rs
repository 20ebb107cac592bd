//! Retrieval engine: query → embedding → project-scoped search → context.
//!
//! The context string handed to the generative model is the text of the
//! retrieved chunks, in ranked order, joined by single spaces. Callers wrap
//! it with task instructions (see [`crate::study`]); an empty context means
//! the project holds nothing relevant and must be handled explicitly.

use std::sync::Arc;

use crate::embedding::{EmbeddingIntent, EmbeddingProvider};
use crate::error::Result;
use crate::models::ScoredChunk;
use crate::store::VectorStore;

/// Result of [`RetrievalEngine::retrieve_context`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedContext {
    /// Ranked chunk texts joined by spaces. Empty when nothing was retrieved.
    pub context: String,
    /// The supporting chunks, best first.
    pub chunks: Vec<ScoredChunk>,
}

impl RetrievedContext {
    pub fn empty() -> Self {
        Self {
            context: String::new(),
            chunks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Orchestrates query embedding, search, and context assembly.
#[derive(Clone)]
pub struct RetrievalEngine {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    min_similarity: Option<f32>,
}

impl RetrievalEngine {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store,
            embedder,
            min_similarity: None,
        }
    }

    /// Drop hits scoring below `threshold`. `None` keeps every hit up to `top_k`.
    pub fn with_min_similarity(mut self, threshold: Option<f32>) -> Self {
        self.min_similarity = threshold;
        self
    }

    /// Retrieve up to `top_k` chunks of `project_id` relevant to `query_text`.
    ///
    /// The query is embedded with [`EmbeddingIntent::Query`]. A blank query
    /// returns an empty context without calling the embedding service.
    pub async fn retrieve_context(
        &self,
        query_text: &str,
        project_id: &str,
        top_k: usize,
    ) -> Result<RetrievedContext> {
        if query_text.trim().is_empty() || top_k == 0 {
            tracing::debug!(project_id, "blank query or zero top_k, nothing to retrieve");
            return Ok(RetrievedContext::empty());
        }

        let query_vector = self
            .embedder
            .embed(query_text, EmbeddingIntent::Query)
            .await?;

        let mut chunks = self.store.search(project_id, &query_vector, top_k).await?;
        if let Some(threshold) = self.min_similarity {
            chunks.retain(|c| c.score >= threshold);
        }

        tracing::debug!(
            project_id,
            hits = chunks.len(),
            best = chunks.first().map(|c| c.score),
            "retrieved context"
        );

        Ok(RetrievedContext {
            context: assemble_context(&chunks),
            chunks,
        })
    }
}

/// Join chunk texts in the given order with single spaces.
pub fn assemble_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
