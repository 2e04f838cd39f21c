//! Language-model backed intent resolver

use std::sync::Arc;

use async_trait::async_trait;
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{IntentRequest, IntentResolver, IntentResponse, ResolverError};
use crate::llm::{CompletionRequest, LlmClient, Message};

const ASSISTANT_TEMPLATE: &str = include_str!("../../prompts/assistant.pmt");

#[derive(Debug, Serialize)]
struct PromptContext<'a> {
    today: String,
    state_summary: &'a str,
    tools: Vec<&'a str>,
}

/// Resolves intent by asking an LLM with the tool schema attached
pub struct LlmIntentResolver {
    client: Arc<dyn LlmClient>,
    hbs: Handlebars<'static>,
    max_tokens: u32,
}

impl LlmIntentResolver {
    pub fn new(client: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        Self {
            client,
            hbs,
            max_tokens,
        }
    }

    /// Render the system prompt for one turn
    pub fn system_prompt(&self, request: &IntentRequest) -> Result<String, ResolverError> {
        let context = PromptContext {
            today: request.today.format("%A, %B %-d, %Y").to_string(),
            state_summary: &request.state_summary,
            tools: request.tools.iter().map(|t| t.name.as_str()).collect(),
        };
        self.hbs
            .render_template(ASSISTANT_TEMPLATE, &context)
            .map_err(|e| ResolverError::Malformed(format!("failed to render system prompt: {}", e)))
    }
}

#[async_trait]
impl IntentResolver for LlmIntentResolver {
    async fn resolve(&self, request: IntentRequest) -> Result<IntentResponse, ResolverError> {
        debug!(
            history = request.history.len(),
            utterance_len = request.utterance.len(),
            "LlmIntentResolver::resolve: called"
        );
        let system_prompt = self.system_prompt(&request)?;

        let mut messages = request.history.clone();
        messages.push(Message::user(request.utterance.clone()));

        let completion = CompletionRequest {
            system_prompt,
            messages,
            tools: request.tools,
            max_tokens: self.max_tokens,
        };

        let response = self.client.complete(completion).await.map_err(|e| {
            warn!(error = %e, "LlmIntentResolver::resolve: completion failed");
            ResolverError::Unavailable(e.to_string())
        })?;

        let reply_text = response.content.unwrap_or_default().trim().to_string();
        if reply_text.is_empty() && response.tool_calls.is_empty() {
            return Err(ResolverError::Malformed("neither reply text nor tool calls".to_string()));
        }

        info!(
            tool_calls = response.tool_calls.len(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Resolved intent"
        );
        Ok(IntentResponse {
            reply_text,
            tool_calls: response.tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::CannedClient;
    use crate::llm::{CompletionResponse, StopReason, TokenUsage, ToolCall};
    use crate::tools;
    use chrono::NaiveDate;

    fn request(utterance: &str) -> IntentRequest {
        IntentRequest {
            history: vec![Message::user("hi"), Message::assistant("Hello!")],
            utterance: utterance.to_string(),
            state_summary: "HABITS:\n  - Record daily video [category: content]".to_string(),
            tools: tools::definitions(),
            today: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
        }
    }

    #[test]
    fn test_system_prompt_includes_state_and_tools() {
        let resolver = LlmIntentResolver::new(Arc::new(CannedClient::new(vec![])), 512);
        let prompt = resolver.system_prompt(&request("x")).unwrap();
        assert!(prompt.contains("Monday, March 9, 2026"));
        assert!(prompt.contains("Record daily video [category: content]"));
        assert!(prompt.contains("manageTask, updateHabit, updateProject, rememberFact"));
    }

    #[tokio::test]
    async fn test_resolve_maps_completion() {
        let call = ToolCall::new(
            "tu_1",
            "updateHabit",
            serde_json::json!({"habitName": "content", "completed": true}),
        );
        let client = Arc::new(CannedClient::new(vec![CompletionResponse {
            content: Some(" Nice, logged it. ".to_string()),
            tool_calls: vec![call.clone()],
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
        }]));
        let resolver = LlmIntentResolver::new(client.clone(), 512);

        let response = resolver.resolve(request("I recorded my video")).await.unwrap();

        assert_eq!(response.reply_text, "Nice, logged it.");
        assert_eq!(response.tool_calls, vec![call]);

        let sent = client.requests();
        assert_eq!(sent[0].messages.len(), 3);
        assert_eq!(sent[0].messages[2].text(), "I recorded my video");
        assert_eq!(sent[0].tools.len(), 4);
    }

    #[tokio::test]
    async fn test_llm_failure_is_unavailable() {
        let resolver = LlmIntentResolver::new(Arc::new(CannedClient::new(vec![])), 512);
        let err = resolver.resolve(request("hello")).await.unwrap_err();
        assert!(matches!(err, ResolverError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_response_is_malformed() {
        let client = Arc::new(CannedClient::new(vec![CompletionResponse::text("   ")]));
        let resolver = LlmIntentResolver::new(client, 512);
        let err = resolver.resolve(request("hello")).await.unwrap_err();
        assert!(matches!(err, ResolverError::Malformed(_)));
    }
}
