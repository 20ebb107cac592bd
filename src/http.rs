//! Shared HTTP plumbing for the embedding and completion clients.
//!
//! Retry strategy (fixed delay between attempts):
//! - Network errors, HTTP 429, and 5xx → retry
//! - Other non-success statuses → fail immediately with [`RagError::Service`]
//! - Budget exhausted → [`RagError::Transient`] carrying the last failure

use std::time::Duration;

use serde_json::Value;
use studydesk_core::{RagError, Result};

/// How many times to try a request and how long to wait between tries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay_secs: u64) -> Self {
        Self {
            max_attempts,
            delay: Duration::from_secs(delay_secs),
        }
    }
}

/// Build a client whose requests all carry `timeout_secs`.
pub fn build_client(service: &str, timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RagError::Service {
            service: service.to_string(),
            message: format!("failed to build HTTP client: {}", e),
        })
}

/// POST `body` as JSON and return the decoded JSON response, retrying per `policy`.
pub async fn post_json(
    client: &reqwest::Client,
    service: &str,
    url: &str,
    api_key: &str,
    body: &Value,
    policy: RetryPolicy,
) -> Result<Value> {
    let attempts = policy.max_attempts.max(1);
    let mut last_err = String::new();

    for attempt in 1..=attempts {
        if attempt > 1 {
            tracing::warn!(
                service,
                attempt,
                max_attempts = attempts,
                delay_secs = policy.delay.as_secs(),
                error = %last_err,
                "retrying request"
            );
            tokio::time::sleep(policy.delay).await;
        }

        let resp = client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response.json::<Value>().await.map_err(|e| RagError::Service {
                        service: service.to_string(),
                        message: format!("invalid JSON response: {}", e),
                    });
                }

                let body_text = response.text().await.unwrap_or_default();
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = format!("HTTP {}: {}", status, body_text);
                    continue;
                }

                return Err(RagError::Service {
                    service: service.to_string(),
                    message: format!("HTTP {}: {}", status, body_text),
                });
            }
            Err(e) => {
                last_err = e.to_string();
                continue;
            }
        }
    }

    Err(RagError::Transient {
        service: service.to_string(),
        attempts,
        message: last_err,
    })
}

/// Read an API key from the environment variable `var`.
pub fn api_key_from_env(service: &str, var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(RagError::Service {
            service: service.to_string(),
            message: format!("{} environment variable not set", var),
        }),
    }
}

/// Join an API base URL and a model path, adding the `models/` prefix if missing.
pub fn model_url(base: &str, model: &str, method: &str) -> String {
    let model = if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    };
    format!("{}/{}:{}", base.trim_end_matches('/'), model, method)
}
