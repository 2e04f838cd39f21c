use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// A model backend that answers one completion at a time
///
/// Holds no conversation state; callers send the history they want the model
/// to see with every request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
