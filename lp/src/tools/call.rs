//! Typed tool calls produced by the validator

use crate::domain::{ProjectStatus, Role};

use super::schema::{MANAGE_TASK, REMEMBER_FACT, UPDATE_HABIT, UPDATE_PROJECT};

/// What `manageTask` should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Add,
    Complete,
    Delete,
}

impl std::str::FromStr for TaskAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "complete" => Ok(Self::Complete),
            "delete" => Ok(Self::Delete),
            _ => Err(format!("Unknown task action: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageTaskArgs {
    pub action: TaskAction,
    pub task_text: String,
    pub role: Option<Role>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateHabitArgs {
    pub habit_name: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProjectArgs {
    pub project_name: String,
    /// `None` keeps the project's current status
    pub status: Option<ProjectStatus>,
    pub update_content: String,
    pub next_step: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberFactArgs {
    pub fact: String,
}

/// A tool call that passed schema validation
///
/// Carries only the fields its schema declares, already trimmed and typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedCall {
    ManageTask(ManageTaskArgs),
    UpdateHabit(UpdateHabitArgs),
    UpdateProject(UpdateProjectArgs),
    RememberFact(RememberFactArgs),
}

impl ValidatedCall {
    /// Wire name of the tool
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::ManageTask(_) => MANAGE_TASK,
            Self::UpdateHabit(_) => UPDATE_HABIT,
            Self::UpdateProject(_) => UPDATE_PROJECT,
            Self::RememberFact(_) => REMEMBER_FACT,
        }
    }
}
