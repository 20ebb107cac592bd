//! Text-completion provider implementations.
//!
//! The completion model is an external collaborator: prompt in, text out.
//! [`GeminiCompletion`] calls `generateContent` with the same retry and
//! timeout policy as the embedding client.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use studydesk_core::embedding::CompletionProvider;
use studydesk_core::{RagError, Result};

use crate::config::CompletionConfig;
use crate::http::{self, RetryPolicy};

const SERVICE: &str = "completion";

/// Always fails. Used when `completion.provider = "disabled"`.
pub struct DisabledCompletion;

#[async_trait]
impl CompletionProvider for DisabledCompletion {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(RagError::Service {
            service: SERVICE.to_string(),
            message: "completion provider is disabled; set [completion] provider in the config"
                .to_string(),
        })
    }
}

pub struct GeminiCompletion {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
    retry: RetryPolicy,
}

impl GeminiCompletion {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = http::api_key_from_env(SERVICE, &config.api_key_env)?;
        Ok(Self {
            client: http::build_client(SERVICE, config.timeout_secs)?,
            url: http::model_url(&config.url, &config.model, "generateContent"),
            model: config.model.clone(),
            api_key,
            retry: RetryPolicy::new(config.max_attempts, config.retry_delay_secs),
        })
    }
}

#[async_trait]
impl CompletionProvider for GeminiCompletion {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });
        let json = http::post_json(&self.client, SERVICE, &self.url, &self.api_key, &body, self.retry)
            .await?;
        parse_generate_response(&json)
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_generate_response(json: &Value) -> Result<String> {
    let service_err = |message: String| RagError::Service {
        service: SERVICE.to_string(),
        message,
    };

    let Some(candidate) = json
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
    else {
        let reason = json
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
            .unwrap_or("no candidates returned");
        return Err(service_err(format!("empty completion: {}", reason)));
    };

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .unwrap_or("no text");
        return Err(service_err(format!("empty completion: {}", reason)));
    }
    Ok(text)
}

/// Create the [`CompletionProvider`] named by the configuration.
pub fn create_completion(config: &CompletionConfig) -> anyhow::Result<Arc<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledCompletion)),
        "gemini" => Ok(Arc::new(GeminiCompletion::new(config)?)),
        other => anyhow::bail!("Unknown completion provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_response() {
        let json = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Mitochondria " }, { "text": "make ATP." }] },
                "finishReason": "STOP"
            }]
        });
        assert_eq!(parse_generate_response(&json).unwrap(), "Mitochondria make ATP.");
    }

    #[test]
    fn test_blocked_prompt_is_an_error() {
        let json = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = parse_generate_response(&json).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_empty_candidate_is_an_error() {
        let json = json!({ "candidates": [{ "finishReason": "MAX_TOKENS" }] });
        let err = parse_generate_response(&json).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[tokio::test]
    async fn test_disabled_completion_errors() {
        assert!(DisabledCompletion.complete("hi").await.is_err());
        let provider = create_completion(&CompletionConfig::default()).unwrap();
        assert_eq!(provider.model_name(), "disabled");
    }
}
