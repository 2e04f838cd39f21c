//! Completion request/response shapes shared by every backend

use serde::{Deserialize, Serialize};

/// Who said a line of the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One line of conversation history
///
/// Turns are plain text on both sides: tool results never travel back to the
/// model, so there is no block structure to carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    /// First `max` characters, with an ellipsis when cut
    pub fn preview(&self, max: usize) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(max).collect();
        if chars.next().is_some() { format!("{}...", head) } else { head }
    }
}

/// A callable tool as advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// A tool invocation proposed by the model, arguments still unchecked
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Reply text, `None` when the model only proposed tool calls
    pub content: Option<String>,
    /// Proposed calls in the order the model emitted them
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

impl CompletionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }
}

/// Why generation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_lines() {
        let msg = Message::user("I recorded my video and went for a run this morning");
        assert_eq!(msg.preview(14), "I recorded my ...");
        assert_eq!(Message::assistant("Nice!").preview(14), "Nice!");
    }

    #[test]
    fn test_message_serializes_as_role_and_text() {
        let json = serde_json::to_value(Message::assistant("Logged it.")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "Logged it."}));
    }

    #[test]
    fn test_stop_reason_tolerates_new_values() {
        let parse = |s: &str| serde_json::from_value::<StopReason>(serde_json::json!(s)).unwrap();
        assert_eq!(parse("tool_use"), StopReason::ToolUse);
        assert_eq!(parse("max_tokens"), StopReason::MaxTokens);
        assert_eq!(parse("pause_turn"), StopReason::Other);
    }
}
