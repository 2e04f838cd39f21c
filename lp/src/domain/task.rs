//! Task records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::generate_id;
use super::Role;

/// How urgent a task is; tasks added through chat start at `Medium`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A to-do item
///
/// `project_id` is a weak reference: it may dangle if the project goes away,
/// and looking it up never implies ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new open task with a fresh ID
    pub fn new(text: impl Into<String>, role: Role, project_id: Option<String>, now: DateTime<Utc>) -> Self {
        let text = text.into();
        Self {
            id: generate_id("task", &text),
            text,
            role,
            project_id,
            completed: false,
            priority: Priority::default(),
            created_at: now,
        }
    }
}
