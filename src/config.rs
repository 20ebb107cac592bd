//! Configuration parsing and validation.
//!
//! Study Desk is configured by a single TOML file (default
//! `./config/studydesk.toml`). Only `[db]` is required; every other section
//! falls back to defaults that reproduce a local Gemini-backed setup.
//!
//! ```toml
//! [db]
//! path = "./data/studydesk.sqlite"
//!
//! [storage]
//! projects_dir = "./projects"
//!
//! [retrieval]
//! top_k = 5
//! # min_similarity = 0.3
//!
//! [embedding]
//! provider = "gemini"
//! model = "models/embedding-001"
//! dims = 768
//! ```
//!
//! API keys are never read from the file; `api_key_env` names the
//! environment variable that holds them.

use anyhow::{bail, Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory holding one subdirectory per project.
    pub projects_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            projects_dir: PathBuf::from("./projects"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    pub window_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_words: studydesk_core::chunk::DEFAULT_WINDOW_WORDS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Hits scoring below this are not used as context. Unset keeps every hit.
    pub min_similarity: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_similarity: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub dims: usize,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub timeout_secs: u64,
    pub api_key_env: String,
    pub url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: "models/embedding-001".to_string(),
            dims: 768,
            batch_size: 32,
            max_attempts: 3,
            retry_delay_secs: 60,
            timeout_secs: 30,
            api_key_env: "GEMINI_API_KEY".to_string(),
            url: GEMINI_API_BASE.to_string(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CompletionConfig {
    pub provider: String,
    pub model: String,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub timeout_secs: u64,
    pub api_key_env: String,
    pub url: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: "gemini-2.0-flash".to_string(),
            max_attempts: 3,
            retry_delay_secs: 60,
            timeout_secs: 120,
            api_key_env: "GEMINI_API_KEY".to_string(),
            url: GEMINI_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    /// Run OCR on pages with no extractable text.
    pub enabled: bool,
    pub pdftoppm_cmd: String,
    pub tesseract_cmd: String,
    pub dpi: u32,
    pub language: String,
    /// Seconds each `pdftoppm` or `tesseract` run may take before it is killed.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pdftoppm_cmd: "pdftoppm".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            dpi: 300,
            language: "eng".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyncConfig {
    /// File-name globs (case-insensitive) picked up from `<project>/documents/`.
    pub document_globs: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            document_globs: vec!["*.pdf".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Read, parse, and validate a configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.chunking.window_words == 0 {
        bail!("chunking.window_words must be > 0");
    }

    if config.retrieval.top_k == 0 {
        bail!("retrieval.top_k must be >= 1");
    }
    if let Some(threshold) = config.retrieval.min_similarity {
        if !(-1.0..=1.0).contains(&threshold) {
            bail!("retrieval.min_similarity must be in [-1.0, 1.0]");
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "gemini" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled or gemini.",
            other
        ),
    }
    if config.embedding.is_enabled() {
        if config.embedding.dims == 0 {
            bail!("embedding.dims must be > 0");
        }
        if config.embedding.batch_size == 0 || config.embedding.batch_size > 100 {
            bail!("embedding.batch_size must be in 1..=100");
        }
        if config.embedding.max_attempts == 0 {
            bail!("embedding.max_attempts must be >= 1");
        }
        if config.embedding.timeout_secs == 0 {
            bail!("embedding.timeout_secs must be > 0");
        }
    }

    match config.completion.provider.as_str() {
        "disabled" | "gemini" => {}
        other => bail!(
            "Unknown completion provider: '{}'. Must be disabled or gemini.",
            other
        ),
    }
    if config.completion.provider != "disabled" {
        if config.completion.max_attempts == 0 {
            bail!("completion.max_attempts must be >= 1");
        }
        if config.completion.timeout_secs == 0 {
            bail!("completion.timeout_secs must be > 0");
        }
    }

    if config.ocr.enabled {
        if config.ocr.dpi == 0 {
            bail!("ocr.dpi must be > 0");
        }
        if config.ocr.timeout_secs == 0 {
            bail!("ocr.timeout_secs must be > 0");
        }
    }

    if config.sync.document_globs.is_empty() {
        bail!("sync.document_globs must not be empty");
    }
    for pattern in &config.sync.document_globs {
        Glob::new(pattern).with_context(|| format!("Invalid sync glob: {}", pattern))?;
    }

    Ok(config)
}
