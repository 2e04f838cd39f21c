//! Project records and their update log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;
use super::id::generate_id;

/// Health of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    OnTrack,
    AtRisk,
    Delayed,
    Completed,
    Maintenance,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::AtRisk => "at_risk",
            Self::Delayed => "delayed",
            Self::Completed => "completed",
            Self::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "on_track" => Ok(Self::OnTrack),
            "at_risk" => Ok(Self::AtRisk),
            "delayed" => Ok(Self::Delayed),
            "completed" => Ok(Self::Completed),
            "maintenance" => Ok(Self::Maintenance),
            _ => Err(format!("Unknown project status: {}", s)),
        }
    }
}

/// Tone of a project update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

/// One entry in a project's update log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub sentiment: Sentiment,
}

/// A project the user is driving
///
/// `updates` is newest-first; new entries are only ever prepended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub updates: Vec<ProjectUpdate>,
    #[serde(default)]
    pub next_step: String,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project with a fresh ID
    pub fn new(name: impl Into<String>, role: Role, status: ProjectStatus, now: DateTime<Utc>) -> Self {
        let name = name.into();
        Self {
            id: generate_id("project", &name),
            name,
            role,
            status,
            updates: Vec::new(),
            next_step: String::new(),
            created_at: now,
        }
    }

    /// Most recent update, if any
    pub fn latest_update(&self) -> Option<&ProjectUpdate> {
        self.updates.first()
    }
}
