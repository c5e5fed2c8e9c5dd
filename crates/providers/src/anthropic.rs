//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly (not an OpenAI-compatible proxy).
//!
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System directive as a top-level field
//!
//! Error vocabulary: HTTP 429 / `rate_limit_error` is request throttling;
//! a 400 `invalid_request_error` mentioning the credit balance is the
//! billing exhaustion case. Both map to quota signals.

use std::time::Duration;

use async_trait::async_trait;
use clinicchat_core::error::ProviderError;
use clinicchat_core::message::{Role, Turn};
use clinicchat_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::openai_compat::{retry_after_secs, transport_error};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const RATE_LIMIT_ERROR: &str = "rate_limit_error";
const CREDIT_BALANCE_MARKER: &str = "credit balance";
const HEALTH_CHECK_MODEL: &str = "claude-3-haiku-20240307";

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Anthropic takes the directive as a top-level `system` field. Only a
    /// leading system turn is lifted; later system turns stay in place as
    /// `user` messages, since the Messages API has no system role.
    fn extract_system(turns: &[Turn]) -> (Option<String>, &[Turn]) {
        match turns.split_first() {
            Some((first, rest)) if first.role == Role::System => {
                (Some(first.content.clone()), rest)
            }
            _ => (None, turns),
        }
    }

    fn wire_role(role: Role) -> &'static str {
        match role {
            Role::Assistant => "assistant",
            Role::User | Role::System => "user",
        }
    }

    fn request_body(request: &CompletionRequest) -> serde_json::Value {
        let (system, turns) = Self::extract_system(&request.turns);
        let messages: Vec<AnthropicMessage> = turns
            .iter()
            .map(|t| AnthropicMessage {
                role: Self::wire_role(t.role).to_string(),
                content: t.content.clone(),
            })
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        if let Some(sys) = system {
            body["system"] = serde_json::json!(sys);
        }

        body
    }

    /// Anthropic always returns one message; its text blocks become the
    /// single candidate.
    fn into_completion(resp: AnthropicResponse) -> CompletionResponse {
        let texts: Vec<String> = resp
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text),
                ResponseContentBlock::Other => None,
            })
            .collect();

        let candidates = if texts.is_empty() {
            Vec::new()
        } else {
            vec![Candidate {
                text: Some(texts.join("\n")),
                finish_reason: resp.stop_reason,
            }]
        };

        CompletionResponse {
            candidates,
            model: resp.model,
            usage: resp.usage.map(|u| Usage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            }),
        }
    }
}

fn error_from_response(status: u16, retry_after: Option<u64>, body: &str) -> ProviderError {
    let detail = serde_json::from_str::<AnthropicErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);

    let (kind, message) = match detail {
        Some(d) => (d.r#type, d.message),
        None => (String::new(), body.to_string()),
    };

    if message.to_lowercase().contains(CREDIT_BALANCE_MARKER) {
        return ProviderError::QuotaExceeded { code: kind, message };
    }

    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(5),
        },
        _ if kind == RATE_LIMIT_ERROR => ProviderError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(5),
        },
        401 | 403 => ProviderError::AuthenticationFailed(message),
        _ => ProviderError::ApiError {
            status_code: status,
            message,
        },
    }
}

#[async_trait]
impl clinicchat_core::Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::request_body(&request);

        debug!(provider = "anthropic", model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();

        if status != 200 {
            let retry_after = retry_after_secs(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(error_from_response(status, retry_after, &error_body));
        }

        let api_resp: AnthropicResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Anthropic response: {e}"))
        })?;

        Ok(Self::into_completion(api_resp))
    }

    /// One-token request. A rejected key is unhealthy; any other answer
    /// means the API is reachable.
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = serde_json::json!({
            "model": HEALTH_CHECK_MODEL,
            "messages": [{"role": "user", "content": "hi"}],
            "max_tokens": 1,
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        debug!(provider = "anthropic", status, "Health check");
        Ok(!matches!(status, 401 | 403))
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ResponseContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorEnvelope {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(default)]
    r#type: String,
    #[serde(default)]
    message: String,
}
