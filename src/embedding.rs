//! Embedding provider implementations.
//!
//! - **[`DisabledProvider`]**: returns errors; used when embeddings are not configured.
//! - **[`GeminiEmbedder`]**: calls the Gemini `batchEmbedContents` endpoint with a
//!   task type taken from the [`EmbeddingIntent`] of each call.
//!
//! # Provider Selection
//!
//! ```rust,no_run
//! # use studydesk::config::EmbeddingConfig;
//! # use studydesk::embedding::create_provider;
//! let config = EmbeddingConfig::default(); // provider = "disabled"
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.model_name(), "disabled");
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use studydesk_core::embedding::{EmbeddingIntent, EmbeddingProvider};
use studydesk_core::{RagError, Result};

use crate::config::EmbeddingConfig;
use crate::http::{self, RetryPolicy};

const SERVICE: &str = "embedding";

// ============ Disabled Provider ============

/// Always fails. Used when `embedding.provider = "disabled"`.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn dims(&self) -> usize {
        0
    }

    async fn embed_batch(&self, _texts: &[String], _intent: EmbeddingIntent) -> Result<Vec<Vec<f32>>> {
        Err(RagError::Service {
            service: SERVICE.to_string(),
            message: "embedding provider is disabled; set [embedding] provider in the config"
                .to_string(),
        })
    }
}

// ============ Gemini Provider ============

/// Embedding provider using the Gemini API.
///
/// Requires the environment variable named by `embedding.api_key_env`
/// (default `GEMINI_API_KEY`).
pub struct GeminiEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dims: usize,
    batch_size: usize,
    api_key: String,
    retry: RetryPolicy,
}

impl GeminiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = http::api_key_from_env(SERVICE, &config.api_key_env)?;
        Ok(Self {
            client: http::build_client(SERVICE, config.timeout_secs)?,
            url: http::model_url(&config.url, &config.model, "batchEmbedContents"),
            model: config.model.clone(),
            dims: config.dims,
            batch_size: config.batch_size,
            api_key,
            retry: RetryPolicy::new(config.max_attempts, config.retry_delay_secs),
        })
    }

    fn request_body(&self, texts: &[String], intent: EmbeddingIntent) -> Value {
        let model = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        let requests: Vec<Value> = texts
            .iter()
            .map(|text| {
                json!({
                    "model": model,
                    "content": { "parts": [{ "text": text }] },
                    "taskType": intent.task_type(),
                })
            })
            .collect();
        json!({ "requests": requests })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_batch(&self, texts: &[String], intent: EmbeddingIntent) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = self.request_body(texts, intent);
        let json = http::post_json(&self.client, SERVICE, &self.url, &self.api_key, &body, self.retry)
            .await?;
        tracing::debug!(count = texts.len(), task_type = intent.task_type(), "embedded batch");
        parse_batch_response(&json)
    }
}

/// Extract `embeddings[].values` in order.
fn parse_batch_response(json: &Value) -> Result<Vec<Vec<f32>>> {
    let invalid = |what: &str| RagError::Service {
        service: SERVICE.to_string(),
        message: format!("invalid embedding response: {}", what),
    };

    let embeddings = json
        .get("embeddings")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("missing embeddings array"))?;

    embeddings
        .iter()
        .map(|item| {
            let values = item
                .get("values")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid("missing values"))?;
            values
                .iter()
                .map(|v| v.as_f64().map(|f| f as f32).ok_or_else(|| invalid("non-numeric value")))
                .collect::<Result<Vec<f32>>>()
        })
        .collect()
}

/// Create the [`EmbeddingProvider`] named by the configuration.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledProvider`] |
/// | `"gemini"` | [`GeminiEmbedder`] |
pub fn create_provider(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledProvider)),
        "gemini" => Ok(Arc::new(GeminiEmbedder::new(config)?)),
        other => anyhow::bail!("Unknown embedding provider: {}", other),
    }
}
