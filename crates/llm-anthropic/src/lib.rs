use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sms_core::{CompletionClient, CompletionError, CompletionRequest, CompletionResponse, Message};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
#[derive(Clone, Debug)]
pub struct AnthropicClient {
    /// API key sent as `x-api-key`. Empty means "not configured".
    api_key: String,
    /// API base URL; override for testing/mocking.
    pub base_url: String,
    /// Value of the `anthropic-version` header.
    pub api_version: String,
    http: reqwest::Client,
}

impl AnthropicClient {
    pub fn with_base_url<S: Into<String>>(api_key: S, base_url: String) -> Self {
        Self {
            api_key: api_key.into(),
            base_url,
            api_version: DEFAULT_API_VERSION.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Bound every call to the Messages API by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, CompletionError> {
        self.http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Unexpected(e.to_string()))?;
        Ok(self)
    }

    pub fn with_api_version<S: Into<String>>(mut self, version: S) -> Self {
        self.api_version = version.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    model: Option<String>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Prefer the provider's own error message over the raw body.
fn describe_failure(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(
        &self,
        req: CompletionRequest<'_>,
    ) -> Result<CompletionResponse, CompletionError> {
        if self.api_key.trim().is_empty() {
            return Err(CompletionError::Auth(
                "no API key configured (set ANTHROPIC_API_KEY)".into(),
            ));
        }

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let payload = MessagesRequest {
            model: req.model,
            max_tokens: req.max_tokens,
            system: req.system,
            messages: req.messages,
        };
        let res = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CompletionError::Http(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let detail = format!("HTTP {}: {}", status, describe_failure(&body));
            return Err(match status.as_u16() {
                401 | 403 => CompletionError::Auth(detail),
                _ => CompletionError::Provider(detail),
            });
        }

        let raw_text = res
            .text()
            .await
            .map_err(|e| CompletionError::Http(e.to_string()))?;
        let parsed: MessagesResponse = serde_json::from_str(&raw_text)
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;
        debug!(
            model = ?parsed.model,
            stop_reason = ?parsed.stop_reason,
            blocks = parsed.content.len(),
            "anthropic response"
        );

        let first = parsed
            .content
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Malformed("response has no content blocks".into()))?;
        let text = first.text.ok_or_else(|| {
            CompletionError::Malformed(format!("first content block is {:?}, not text", first.kind))
        })?;

        Ok(CompletionResponse {
            text,
            model: parsed.model,
            stop_reason: parsed.stop_reason,
        })
    }
}
