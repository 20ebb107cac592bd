//! Embedding and completion service traits, plus vector utilities.
//!
//! The generative model and the embedding model are external collaborators.
//! Components receive them as injected trait objects ([`EmbeddingProvider`],
//! [`CompletionProvider`]) so tests can substitute deterministic doubles.
//! Concrete HTTP clients live in the `studydesk` app crate.
//!
//! Vector helpers:
//! - [`vec_to_blob`] / [`blob_to_vec`]: little-endian f32 encoding for SQLite BLOBs
//! - [`cosine_similarity`]: similarity metric used by every store

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{RagError, Result};

/// What a piece of text is being embedded for.
///
/// Document chunks and user queries are embedded with different task
/// configurations; mixing them degrades retrieval quality, so every call
/// names its intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EmbeddingIntent {
    /// A chunk of source material that will be stored and searched.
    Document,
    /// A question or topic used to search stored chunks.
    Query,
}

impl EmbeddingIntent {
    /// Task-type label understood by the embedding service.
    pub fn task_type(self) -> &'static str {
        match self {
            EmbeddingIntent::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingIntent::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// An embedding backend.
///
/// Implementors provide [`embed_batch`](EmbeddingProvider::embed_batch), a
/// single round trip for at most [`batch_size`](EmbeddingProvider::batch_size)
/// texts. [`embed_many`](EmbeddingProvider::embed_many) and
/// [`embed`](EmbeddingProvider::embed) are built on top of it and validate
/// the response shape.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"models/embedding-001"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding dimensionality (e.g. `768`). `0` disables the check.
    fn dims(&self) -> usize;

    /// Maximum number of texts sent in one request.
    fn batch_size(&self) -> usize {
        32
    }

    /// Embed one batch of texts, returning one vector per text in input order.
    async fn embed_batch(&self, texts: &[String], intent: EmbeddingIntent)
        -> Result<Vec<Vec<f32>>>;

    /// Embed any number of texts, batching as needed. Output order matches input.
    async fn embed_many(
        &self,
        texts: &[String],
        intent: EmbeddingIntent,
    ) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size().max(1)) {
            let vectors = self.embed_batch(batch, intent).await?;
            check_vectors(batch.len(), self.dims(), &vectors)?;
            out.extend(vectors);
        }
        Ok(out)
    }

    /// Embed a single text.
    async fn embed(&self, text: &str, intent: EmbeddingIntent) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut vectors = self.embed_many(&texts, intent).await?;
        vectors.pop().ok_or_else(|| RagError::Service {
            service: "embedding".to_string(),
            message: "empty embedding response".to_string(),
        })
    }
}

/// A text-generation backend (prompt in, text out).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

fn check_vectors(expected: usize, dims: usize, vectors: &[Vec<f32>]) -> Result<()> {
    if vectors.len() != expected {
        return Err(RagError::Service {
            service: "embedding".to_string(),
            message: format!(
                "expected {} embeddings, service returned {}",
                expected,
                vectors.len()
            ),
        });
    }
    if dims > 0 {
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            return Err(RagError::DimensionMismatch {
                expected: dims,
                actual: bad.len(),
            });
        }
    }
    Ok(())
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// # Example
///
/// ```rust
/// use studydesk_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12); // 3 × 4 bytes
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
///
/// Reverses [`vec_to_blob`]. Trailing bytes that do not form a whole `f32`
/// are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`. Returns `0.0` when either vector has
/// zero magnitude, when either is empty, or when their lengths differ, so
/// degenerate vectors rank low instead of producing `NaN`.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_vec_blob_roundtrip_bit_exact() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001, f32::MIN_POSITIVE, 1e-30];
        let restored = blob_to_vec(&vec_to_blob(&vec));
        let bits: Vec<u32> = vec.iter().map(|f| f.to_bits()).collect();
        let restored_bits: Vec<u32> = restored.iter().map(|f| f.to_bits()).collect();
        assert_eq!(bits, restored_bits);
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![0.3, -2.0, 7.5, 0.01];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_small_nonzero_vector() {
        let v = vec![1e-4f32, 2e-4];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        let v = vec![1.0, 2.0, 3.0];
        let zero = vec![0.0; 3];
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_cosine_empty_and_mismatched() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_task_types() {
        assert_eq!(EmbeddingIntent::Document.task_type(), "RETRIEVAL_DOCUMENT");
        assert_eq!(EmbeddingIntent::Query.task_type(), "RETRIEVAL_QUERY");
    }

    /// Records each batch it receives and returns `[len, index]` vectors.
    struct RecordingProvider {
        dims: usize,
        batches: Mutex<Vec<(usize, EmbeddingIntent)>>,
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingProvider {
        fn model_name(&self) -> &str {
            "recording"
        }
        fn dims(&self) -> usize {
            self.dims
        }
        fn batch_size(&self) -> usize {
            2
        }
        async fn embed_batch(
            &self,
            texts: &[String],
            intent: EmbeddingIntent,
        ) -> Result<Vec<Vec<f32>>> {
            self.batches.lock().unwrap().push((texts.len(), intent));
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, t.parse::<f32>().unwrap_or(0.0)])
                .collect())
        }
    }

    #[tokio::test]
    async fn test_embed_many_batches_and_preserves_order() {
        let provider = RecordingProvider {
            dims: 2,
            batches: Mutex::new(Vec::new()),
        };
        let texts: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        let vectors = provider
            .embed_many(&texts, EmbeddingIntent::Document)
            .await
            .unwrap();
        let order: Vec<f32> = vectors.iter().map(|v| v[1]).collect();
        assert_eq!(order, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        let batches = provider.batches.lock().unwrap().clone();
        assert_eq!(
            batches,
            vec![
                (2, EmbeddingIntent::Document),
                (2, EmbeddingIntent::Document),
                (1, EmbeddingIntent::Document)
            ]
        );
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_an_error() {
        let provider = RecordingProvider {
            dims: 768,
            batches: Mutex::new(Vec::new()),
        };
        let err = provider
            .embed("hello", EmbeddingIntent::Query)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 768,
                actual: 2
            }
        ));
    }
}
