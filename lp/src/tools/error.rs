//! Tool call rejection reasons

use thiserror::Error;

/// Why a proposed tool call was rejected before execution
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    UnknownTool { name: String },

    #[error("Arguments for {tool} must be a JSON object")]
    NotAnObject { tool: String },

    #[error("{tool} does not accept field '{field}'")]
    UnknownField { tool: String, field: String },

    #[error("{tool} requires field '{field}'")]
    MissingField { tool: String, field: String },

    #[error("Field '{field}' must be a {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("Field '{field}' must be one of [{}], got '{value}'", allowed.join(", "))]
    NotInEnum {
        field: String,
        value: String,
        allowed: Vec<&'static str>,
    },

    #[error("Field '{field}' must not be empty")]
    Blank { field: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_in_enum_message_lists_allowed() {
        let err = ToolError::NotInEnum {
            field: "status".to_string(),
            value: "blocked".to_string(),
            allowed: vec!["on_track", "at_risk"],
        };

        let msg = err.to_string();
        assert!(msg.contains("on_track, at_risk"));
        assert!(msg.contains("blocked"));
    }

    #[test]
    fn test_missing_field_message() {
        let err = ToolError::MissingField {
            tool: "rememberFact".to_string(),
            field: "fact".to_string(),
        };
        assert_eq!(err.to_string(), "rememberFact requires field 'fact'");
    }
}
