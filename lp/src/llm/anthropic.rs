//! Anthropic Messages API backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, StopReason, TokenUsage, ToolCall,
    ToolDefinition,
};
use crate::config::LlmConfig;

const API_VERSION: &str = "2023-06-01";

/// Longest server-requested pause we wait out before failing the turn
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(10);

/// Exponential retry schedule for transient failures
#[derive(Debug, Clone, Copy)]
struct Backoff {
    retries: u32,
    base: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            retries: 3,
            base: Duration::from_millis(500),
        }
    }
}

impl Backoff {
    /// Pause before retry number `retry` (1-based), `None` to give up
    fn delay(&self, retry: u32, error: &LlmError) -> Option<Duration> {
        if retry > self.retries || !error.is_retryable() {
            return None;
        }
        match error.retry_after() {
            Some(wait) if wait > MAX_RATE_LIMIT_WAIT => None,
            Some(wait) => Some(wait),
            None => Some(self.base * 2u32.pow(retry - 1)),
        }
    }
}

pub struct AnthropicClient {
    model: String,
    api_key: String,
    endpoint: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
    backoff: Backoff,
}

impl AnthropicClient {
    /// Build a client, reading the API key from the configured variable
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key =
            std::env::var(&config.api_key_env).map_err(|_| LlmError::MissingApiKey(config.api_key_env.clone()))?;
        let timeout = Duration::from_millis(config.timeout_ms);

        Ok(Self {
            model: config.model.clone(),
            api_key,
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            http: Client::builder().timeout(timeout).build()?,
            max_tokens: config.max_tokens,
            timeout,
            backoff: Backoff::default(),
        })
    }

    fn wire_request<'a>(&'a self, request: &'a CompletionRequest) -> WireRequest<'a> {
        WireRequest {
            model: &self.model,
            max_tokens: request.max_tokens.min(self.max_tokens),
            system: &request.system_prompt,
            messages: &request.messages,
            tools: &request.tools,
        }
    }

    async fn send_once(&self, body: &WireRequest<'_>) -> Result<WireResponse, LlmError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::Transport(e)
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let seconds = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(60);
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(seconds),
            });
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| LlmError::Decode(e.to_string()))
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.model, messages = request.messages.len(), "complete: called");
        let body = self.wire_request(&request);

        let mut retry = 0;
        loop {
            match self.send_once(&body).await {
                Ok(wire) => return Ok(wire.into()),
                Err(error) => {
                    retry += 1;
                    let Some(wait) = self.backoff.delay(retry, &error) else {
                        return Err(error);
                    };
                    warn!(retry, wait_ms = wait.as_millis() as u64, %error, "complete: transient failure, retrying");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Vec<WireBlock>,
    stop_reason: Option<StopReason>,
    #[serde(default)]
    usage: TokenUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

impl From<WireResponse> for CompletionResponse {
    fn from(wire: WireResponse) -> Self {
        let mut texts = Vec::new();
        let mut tool_calls = Vec::new();
        for block in wire.content {
            match block {
                WireBlock::Text { text } => texts.push(text),
                WireBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall { id, name, input }),
                WireBlock::Other => {}
            }
        }

        CompletionResponse {
            content: (!texts.is_empty()).then(|| texts.join("\n")),
            tool_calls,
            stop_reason: wire.stop_reason.unwrap_or(StopReason::EndTurn),
            usage: wire.usage,
        }
    }
}
