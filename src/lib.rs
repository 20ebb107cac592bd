//! # Study Desk
//!
//! A local-first study assistant. PDFs are grouped into projects, split into
//! page-attributed chunks, embedded, and stored in SQLite; questions, mind
//! maps, and quizzes are answered from the chunks most similar to the
//! request.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌───────────────┐
//! │ PDF upload / │──▶│ extract + chunk  │──▶│    SQLite     │
//! │  fs sync     │   │ + embed (doc)    │   │ text_chunks   │
//! └──────────────┘   └──────────────────┘   └───────┬───────┘
//!                                                   │ cosine
//!                     ┌──────────────────┐          ▼
//!   question ────────▶│ RetrievalEngine  │◀── project-scoped search
//!                     └────────┬─────────┘
//!                              ▼
//!                     ask / mindmap / quiz ──▶ completion model
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! studydesk init
//! studydesk project create biology
//! studydesk doc add biology ./cell-structure.pdf
//! studydesk ask biology "What does the mitochondrion do?"
//! studydesk quiz biology "cell organelles" --questions 5
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `VectorStore` |
//! | [`extract`] | PDF text extraction with OCR fallback |
//! | [`http`] | Retrying JSON client shared by the model clients |
//! | [`embedding`] | Embedding providers |
//! | [`completion`] | Completion providers |
//! | [`repository`] | Projects, documents, ingestion, and sync |
//! | [`study`] | Question answering, mind maps, quizzes |
//! | [`stats`] | Database statistics |
//! | [`commands`] | CLI command implementations |

pub mod commands;
pub mod completion;
pub mod config;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod http;
pub mod logging;
pub mod migrate;
pub mod repository;
pub mod sqlite_store;
pub mod stats;
pub mod study;

pub use studydesk_core as core;
