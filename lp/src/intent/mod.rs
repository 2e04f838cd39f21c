//! Intent Resolver
//!
//! Turns an utterance, the conversation so far and a digest of current state
//! into a reply plus zero or more raw tool calls. The resolver is opaque to the
//! rest of the engine: anything that implements [`IntentResolver`] will do.

mod llm;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::llm::{Message, ToolCall, ToolDefinition};

pub use llm::LlmIntentResolver;

/// Everything the resolver sees for one turn
#[derive(Debug, Clone)]
pub struct IntentRequest {
    pub history: Vec<Message>,
    pub utterance: String,
    /// Plain-text digest of projects, tasks, habits and facts
    pub state_summary: String,
    pub tools: Vec<ToolDefinition>,
    pub today: NaiveDate,
}

/// What the resolver proposes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntentResponse {
    pub reply_text: String,
    /// In the order they should be executed
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("assistant service unavailable: {0}")]
    Unavailable(String),

    #[error("assistant returned an unusable response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait IntentResolver: Send + Sync {
    async fn resolve(&self, request: IntentRequest) -> Result<IntentResponse, ResolverError>;
}

/// Stand-in when no assistant service is configured
///
/// Every turn aborts with `Unavailable`; direct operations still work.
#[derive(Debug, Clone, Default)]
pub struct OfflineResolver {
    pub reason: String,
}

impl OfflineResolver {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl IntentResolver for OfflineResolver {
    async fn resolve(&self, _request: IntentRequest) -> Result<IntentResponse, ResolverError> {
        Err(ResolverError::Unavailable(self.reason.clone()))
    }
}
