use std::time::Duration;

use thiserror::Error;

/// Failure to get a completion out of the model service
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: set the {0} environment variable")]
    MissingApiKey(String),

    #[error("Unknown LLM provider: '{0}'. Supported: anthropic")]
    UnknownProvider(String),

    #[error("Could not reach the model service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Model service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Model service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unreadable completion: {0}")]
    Decode(String),
}

impl LlmError {
    /// Transient failures that a later attempt may get past
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport(_) | LlmError::Timeout(_) | LlmError::RateLimited { .. } => true,
            LlmError::Status { status, .. } => matches!(status, 408 | 500..=599),
            LlmError::MissingApiKey(_) | LlmError::UnknownProvider(_) | LlmError::Decode(_) => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
