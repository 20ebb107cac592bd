//! # Study Desk Core
//!
//! Shared logic for Study Desk's retrieval-augmented study assistant:
//! data models, the word-window chunker, embedding and completion service
//! traits, the vector store abstraction, the retrieval engine, and the
//! prompt framing / response parsing used by study tasks.
//!
//! This crate contains no tokio, sqlx, filesystem, or network code. The
//! `studydesk` application crate supplies the SQLite store, HTTP clients,
//! and PDF extraction.
//!
//! ```text
//! pages ──▶ chunk ──▶ EmbeddingProvider ──▶ VectorStore
//!                                              │
//! query ──▶ EmbeddingProvider ──▶ search ◀─────┘
//!                                   │
//!                                   ▼
//!                          RetrievalEngine ──▶ context string
//! ```

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod models;
pub mod retrieval;
pub mod store;
pub mod study;

pub use error::{RagError, Result};
