//! Typed failures for the retrieval pipeline.
//!
//! Every core operation returns [`Result`]. Failures are never replaced by
//! default data (an empty vector, a zero embedding, an empty answer); the
//! caller decides how to render them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    /// An external service kept failing transiently until the retry budget ran out.
    #[error("{service} failed after {attempts} attempts: {message}")]
    Transient {
        service: String,
        attempts: u32,
        message: String,
    },

    /// An external service rejected the request (not worth retrying).
    #[error("{service} error: {message}")]
    Service { service: String, message: String },

    /// Model output did not have the expected structure. `raw` is the full response.
    #[error("malformed model response: {reason}")]
    ContentFormat { reason: String, raw: String },

    #[error("chunk {chunk_index} already exists for document {document_id}")]
    DuplicateChunk {
        document_id: String,
        chunk_index: i64,
    },

    #[error("a project named '{0}' already exists")]
    DuplicateProjectName(String),

    #[error("project {project_id} already has a different file named '{file_name}'")]
    DuplicateFileName {
        project_id: String,
        file_name: String,
    },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Retrieval found nothing to ground a generation request on.
    #[error("no indexed content in project {project_id} relevant to '{query}'")]
    NoContext { project_id: String, query: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        RagError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Raw model output attached to a [`RagError::ContentFormat`] failure.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            RagError::ContentFormat { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RagError>;
