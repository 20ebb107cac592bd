//! Core data models used throughout Study Desk.
//!
//! A [`Project`] owns [`Document`]s, a document owns its [`TextChunk`]s, and
//! every chunk carries exactly one embedding vector. Nothing is shared across
//! projects.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// A named knowledge base backed by a directory on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub path: String,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

/// An uploaded file within a project, identified by the hash of its bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub project_id: String,
    pub file_name: String,
    pub file_hash: String,
}

/// Text extracted from one page of a source file.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub text: String,
    /// 1-indexed.
    pub page_number: i64,
}

impl PageText {
    pub fn new(text: impl Into<String>, page_number: i64) -> Self {
        Self {
            text: text.into(),
            page_number,
        }
    }
}

/// Chunker output: a span of words attributed to the page of its first word.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDraft {
    pub text: String,
    pub page_number: i64,
    pub chunk_index: i64,
}

/// A chunk ready to be persisted together with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChunk {
    pub text: String,
    pub page_number: i64,
    pub chunk_index: i64,
    pub vector: Vec<f32>,
}

impl NewChunk {
    pub fn from_draft(draft: ChunkDraft, vector: Vec<f32>) -> Self {
        Self {
            text: draft.text,
            page_number: draft.page_number,
            chunk_index: draft.chunk_index,
            vector,
        }
    }
}

/// A persisted chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextChunk {
    pub id: String,
    pub document_id: String,
    pub text: String,
    pub page_number: i64,
    pub chunk_index: i64,
    #[serde(skip)]
    pub vector: Vec<f32>,
}

/// A search hit, ranked by cosine similarity to the query vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub score: f32,
    pub chunk_id: String,
    pub document_id: String,
    pub text: String,
    pub page_number: i64,
    pub chunk_index: i64,
    #[serde(skip)]
    pub vector: Vec<f32>,
}

/// SHA-256 of raw file bytes, lowercase hex.
///
/// Two uploads with identical bytes share a hash regardless of file name.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
