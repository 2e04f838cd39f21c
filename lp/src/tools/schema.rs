//! Declared tool schema
//!
//! The four tools the intent resolver may call. Names, field names and enum
//! values are part of the wire contract with the resolver and must not drift.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::llm::ToolDefinition;

pub const MANAGE_TASK: &str = "manageTask";
pub const UPDATE_HABIT: &str = "updateHabit";
pub const UPDATE_PROJECT: &str = "updateProject";
pub const REMEMBER_FACT: &str = "rememberFact";

pub const TASK_ACTIONS: &[&str] = &["add", "complete", "delete"];
pub const ROLES: &[&str] = &["COO", "Founder", "PM", "Personal"];
pub const PROJECT_STATUSES: &[&str] = &["on_track", "at_risk", "delayed", "completed"];

/// Value type of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Boolean,
    Enum(&'static [&'static str]),
}

/// One field of a tool's input
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// A present-but-blank value means "leave unchanged" instead of a rejection
    pub blank_means_unset: bool,
    pub description: &'static str,
}

impl FieldSpec {
    const fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            blank_means_unset: false,
            description,
        }
    }

    const fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            blank_means_unset: true,
            description,
        }
    }

    fn json_schema(&self) -> Value {
        match self.kind {
            FieldKind::Text => json!({ "type": "string", "description": self.description }),
            FieldKind::Boolean => json!({ "type": "boolean", "description": self.description }),
            FieldKind::Enum(values) => json!({
                "type": "string",
                "enum": values,
                "description": self.description,
            }),
        }
    }
}

/// A tool the intent resolver can call
#[derive(Debug, Clone, Copy)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
}

impl ToolSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// JSON Schema for the tool's input object
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.fields {
            properties.insert(field.name.to_string(), field.json_schema());
        }
        let required: Vec<&str> = self.fields.iter().filter(|f| f.required).map(|f| f.name).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name, self.description, self.input_schema())
    }
}

static TOOLS: [ToolSchema; 4] = [
    ToolSchema {
        name: MANAGE_TASK,
        description: "Add, complete or delete a task on the user's list.",
        fields: &[
            FieldSpec::required("action", FieldKind::Enum(TASK_ACTIONS), "What to do with the task"),
            FieldSpec::required(
                "taskText",
                FieldKind::Text,
                "Text of the new task, or enough of an existing task's text to identify it",
            ),
            FieldSpec::optional("role", FieldKind::Enum(ROLES), "Role the task belongs to"),
            FieldSpec::optional("projectName", FieldKind::Text, "Name of the project the task belongs to"),
        ],
    },
    ToolSchema {
        name: UPDATE_HABIT,
        description: "Log whether a habit was done today.",
        fields: &[
            FieldSpec::required("habitName", FieldKind::Text, "Name or category of the habit"),
            FieldSpec::required("completed", FieldKind::Boolean, "True if the habit was done today"),
        ],
    },
    ToolSchema {
        name: UPDATE_PROJECT,
        description: "Record a progress update on a project, optionally changing its status and next step.",
        fields: &[
            FieldSpec::required("projectName", FieldKind::Text, "Name of the project"),
            FieldSpec {
                blank_means_unset: true,
                ..FieldSpec::required(
                    "status",
                    FieldKind::Enum(PROJECT_STATUSES),
                    "New project status; empty keeps the current one",
                )
            },
            FieldSpec::required("updateContent", FieldKind::Text, "What happened, in one or two sentences"),
            FieldSpec::optional("nextStep", FieldKind::Text, "The next concrete step, if it changed"),
        ],
    },
    ToolSchema {
        name: REMEMBER_FACT,
        description: "Remember a durable fact about the user for future conversations.",
        fields: &[FieldSpec::required("fact", FieldKind::Text, "The fact, as a short sentence")],
    },
];

/// All declared tools
pub fn tools() -> &'static [ToolSchema] {
    &TOOLS
}

/// Look up a tool by its wire name
pub fn schema_for(name: &str) -> Option<&'static ToolSchema> {
    debug!(%name, "schema_for: called");
    TOOLS.iter().find(|t| t.name == name)
}

/// Tool definitions for the intent resolver
pub fn definitions() -> Vec<ToolDefinition> {
    TOOLS.iter().map(ToolSchema::definition).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_are_wire_exact() {
        let names: Vec<&str> = tools().iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["manageTask", "updateHabit", "updateProject", "rememberFact"]);
    }

    #[test]
    fn test_manage_task_schema() {
        let schema = schema_for(MANAGE_TASK).unwrap().input_schema();
        assert_eq!(schema["required"], json!(["action", "taskText"]));
        assert_eq!(schema["properties"]["action"]["enum"], json!(["add", "complete", "delete"]));
        assert_eq!(schema["properties"]["role"]["enum"], json!(["COO", "Founder", "PM", "Personal"]));
        assert!(schema["properties"].get("projectName").is_some());
    }

    #[test]
    fn test_update_project_schema() {
        let schema = schema_for(UPDATE_PROJECT).unwrap().input_schema();
        assert_eq!(schema["required"], json!(["projectName", "status", "updateContent"]));
        assert_eq!(
            schema["properties"]["status"]["enum"],
            json!(["on_track", "at_risk", "delayed", "completed"])
        );
    }

    #[test]
    fn test_update_habit_and_fact_schema() {
        let habit = schema_for(UPDATE_HABIT).unwrap().input_schema();
        assert_eq!(habit["required"], json!(["habitName", "completed"]));
        assert_eq!(habit["properties"]["completed"]["type"], "boolean");

        let fact = schema_for(REMEMBER_FACT).unwrap().input_schema();
        assert_eq!(fact["required"], json!(["fact"]));
    }

    #[test]
    fn test_definitions_cover_every_tool() {
        let defs = definitions();
        assert_eq!(defs.len(), 4);
        assert!(defs.iter().all(|d| d.input_schema["type"] == "object"));
    }

    #[test]
    fn test_unknown_tool() {
        assert!(schema_for("deleteProject").is_none());
    }
}
