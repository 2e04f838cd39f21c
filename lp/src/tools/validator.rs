//! Tool Call Validator
//!
//! Checks a raw tool call against its declared schema: known tool, object
//! input, no undeclared fields, required fields present, value types, enum
//! membership (exact, case-sensitive) and non-blank text.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::domain::{ProjectStatus, Role};
use crate::llm::ToolCall;

use super::ToolError;
use super::call::{ManageTaskArgs, RememberFactArgs, TaskAction, UpdateHabitArgs, UpdateProjectArgs, ValidatedCall};
use super::schema::{
    FieldKind, FieldSpec, MANAGE_TASK, REMEMBER_FACT, ToolSchema, UPDATE_HABIT, UPDATE_PROJECT, schema_for,
};

#[derive(Debug, Clone)]
enum Checked {
    Text(String),
    Bool(bool),
}

/// Field values that passed their per-field checks
struct CheckedFields {
    tool: &'static str,
    values: HashMap<&'static str, Checked>,
}

impl CheckedFields {
    fn text(&self, field: &str) -> Option<String> {
        match self.values.get(field) {
            Some(Checked::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn required_text(&self, field: &str) -> Result<String, ToolError> {
        self.text(field).ok_or_else(|| ToolError::MissingField {
            tool: self.tool.to_string(),
            field: field.to_string(),
        })
    }

    fn required_bool(&self, field: &str) -> Result<bool, ToolError> {
        match self.values.get(field) {
            Some(Checked::Bool(b)) => Ok(*b),
            _ => Err(ToolError::MissingField {
                tool: self.tool.to_string(),
                field: field.to_string(),
            }),
        }
    }
}

/// Validate a raw tool call into a typed call
pub fn validate(call: &ToolCall) -> Result<ValidatedCall, ToolError> {
    debug!(tool_name = %call.name, tool_id = %call.id, "validate: called");
    let schema = schema_for(&call.name).ok_or_else(|| ToolError::UnknownTool {
        name: call.name.clone(),
    })?;

    let fields = check_fields(schema, &call.input)?;

    let validated = match schema.name {
        MANAGE_TASK => {
            let action = fields
                .required_text("action")?
                .parse::<TaskAction>()
                .map_err(|_| not_in_enum(schema, "action", &fields))?;
            ValidatedCall::ManageTask(ManageTaskArgs {
                action,
                task_text: fields.required_text("taskText")?,
                role: fields.text("role").and_then(|r| r.parse::<Role>().ok()),
                project_name: fields.text("projectName"),
            })
        }
        UPDATE_HABIT => ValidatedCall::UpdateHabit(UpdateHabitArgs {
            habit_name: fields.required_text("habitName")?,
            completed: fields.required_bool("completed")?,
        }),
        UPDATE_PROJECT => ValidatedCall::UpdateProject(UpdateProjectArgs {
            project_name: fields.required_text("projectName")?,
            status: fields.text("status").and_then(|s| s.parse::<ProjectStatus>().ok()),
            update_content: fields.required_text("updateContent")?,
            next_step: fields.text("nextStep"),
        }),
        REMEMBER_FACT => ValidatedCall::RememberFact(RememberFactArgs {
            fact: fields.required_text("fact")?,
        }),
        other => {
            return Err(ToolError::UnknownTool {
                name: other.to_string(),
            });
        }
    };

    debug!(tool_name = %call.name, "validate: accepted");
    Ok(validated)
}

fn not_in_enum(schema: &ToolSchema, field: &str, fields: &CheckedFields) -> ToolError {
    let allowed = match schema.field(field).map(|f| f.kind) {
        Some(FieldKind::Enum(values)) => values.to_vec(),
        _ => Vec::new(),
    };
    ToolError::NotInEnum {
        field: field.to_string(),
        value: fields.text(field).unwrap_or_default(),
        allowed,
    }
}

fn check_fields(schema: &'static ToolSchema, input: &Value) -> Result<CheckedFields, ToolError> {
    let object = input.as_object().ok_or_else(|| ToolError::NotAnObject {
        tool: schema.name.to_string(),
    })?;

    if let Some(unknown) = object.keys().find(|k| schema.field(k).is_none()) {
        debug!(tool_name = %schema.name, field = %unknown, "check_fields: undeclared field");
        return Err(ToolError::UnknownField {
            tool: schema.name.to_string(),
            field: unknown.clone(),
        });
    }

    let mut values = HashMap::new();
    for spec in schema.fields {
        let value = match object.get(spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    return Err(ToolError::MissingField {
                        tool: schema.name.to_string(),
                        field: spec.name.to_string(),
                    });
                }
                continue;
            }
            Some(value) => value,
        };

        if let Some(checked) = check_value(spec, value)? {
            values.insert(spec.name, checked);
        }
    }

    Ok(CheckedFields {
        tool: schema.name,
        values,
    })
}

/// Check one present value; `Ok(None)` means blank-and-allowed (treated as unset)
fn check_value(spec: &FieldSpec, value: &Value) -> Result<Option<Checked>, ToolError> {
    match spec.kind {
        FieldKind::Boolean => match value {
            Value::Bool(b) => Ok(Some(Checked::Bool(*b))),
            _ => Err(ToolError::WrongType {
                field: spec.name.to_string(),
                expected: "boolean",
            }),
        },
        FieldKind::Text | FieldKind::Enum(_) => {
            let Value::String(raw) = value else {
                return Err(ToolError::WrongType {
                    field: spec.name.to_string(),
                    expected: "string",
                });
            };

            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return if spec.blank_means_unset {
                    Ok(None)
                } else {
                    Err(ToolError::Blank {
                        field: spec.name.to_string(),
                    })
                };
            }

            if let FieldKind::Enum(allowed) = spec.kind
                && !allowed.contains(&trimmed)
            {
                return Err(ToolError::NotInEnum {
                    field: spec.name.to_string(),
                    value: trimmed.to_string(),
                    allowed: allowed.to_vec(),
                });
            }

            Ok(Some(Checked::Text(trimmed.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, input: Value) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            input,
        }
    }

    #[test]
    fn test_manage_task_add() {
        let result = validate(&call(
            "manageTask",
            json!({"action": "add", "taskText": "  Email Sam  ", "role": "COO", "projectName": "Ops"}),
        ))
        .unwrap();

        assert_eq!(
            result,
            ValidatedCall::ManageTask(ManageTaskArgs {
                action: TaskAction::Add,
                task_text: "Email Sam".to_string(),
                role: Some(Role::Coo),
                project_name: Some("Ops".to_string()),
            })
        );
    }

    #[test]
    fn test_unknown_tool_rejected() {
        let err = validate(&call("deleteEverything", json!({}))).unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool { .. }));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = validate(&call("rememberFact", json!("likes tea"))).unwrap_err();
        assert!(matches!(err, ToolError::NotAnObject { .. }));
    }

    #[test]
    fn test_undeclared_field_rejected() {
        let err = validate(&call("rememberFact", json!({"fact": "x", "priority": "high"}))).unwrap_err();
        assert_eq!(
            err,
            ToolError::UnknownField {
                tool: "rememberFact".to_string(),
                field: "priority".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let err = validate(&call("updateHabit", json!({"habitName": "gym"}))).unwrap_err();
        assert!(matches!(err, ToolError::MissingField { ref field, .. } if field == "completed"));

        let err = validate(&call("manageTask", json!({"action": "add", "taskText": null}))).unwrap_err();
        assert!(matches!(err, ToolError::MissingField { ref field, .. } if field == "taskText"));
    }

    #[test]
    fn test_enum_membership_is_exact() {
        let err = validate(&call("manageTask", json!({"action": "finish", "taskText": "x"}))).unwrap_err();
        assert!(matches!(err, ToolError::NotInEnum { ref field, .. } if field == "action"));

        let err = validate(&call("manageTask", json!({"action": "add", "taskText": "x", "role": "coo"}))).unwrap_err();
        assert!(matches!(err, ToolError::NotInEnum { ref field, .. } if field == "role"));

        // maintenance is a project status but not something the tool may set
        let err = validate(&call(
            "updateProject",
            json!({"projectName": "A", "status": "maintenance", "updateContent": "x"}),
        ))
        .unwrap_err();
        assert!(matches!(err, ToolError::NotInEnum { ref field, .. } if field == "status"));
    }

    #[test]
    fn test_blank_text_rejected() {
        let err = validate(&call("rememberFact", json!({"fact": "   "}))).unwrap_err();
        assert_eq!(
            err,
            ToolError::Blank {
                field: "fact".to_string()
            }
        );
    }

    #[test]
    fn test_wrong_types_rejected() {
        let err = validate(&call("updateHabit", json!({"habitName": "gym", "completed": "yes"}))).unwrap_err();
        assert!(matches!(err, ToolError::WrongType { expected: "boolean", .. }));

        let err = validate(&call("rememberFact", json!({"fact": 42}))).unwrap_err();
        assert!(matches!(err, ToolError::WrongType { expected: "string", .. }));
    }

    #[test]
    fn test_update_project_blank_status_keeps_current() {
        let result = validate(&call(
            "updateProject",
            json!({"projectName": "No Excuse", "status": "", "updateContent": "shipped", "nextStep": " "}),
        ))
        .unwrap();

        assert_eq!(
            result,
            ValidatedCall::UpdateProject(UpdateProjectArgs {
                project_name: "No Excuse".to_string(),
                status: None,
                update_content: "shipped".to_string(),
                next_step: None,
            })
        );
    }

    #[test]
    fn test_update_project_status_required_present() {
        let err = validate(&call("updateProject", json!({"projectName": "A", "updateContent": "x"}))).unwrap_err();
        assert!(matches!(err, ToolError::MissingField { ref field, .. } if field == "status"));
    }

    #[test]
    fn test_update_habit_and_fact() {
        assert_eq!(
            validate(&call("updateHabit", json!({"habitName": "content", "completed": true}))).unwrap(),
            ValidatedCall::UpdateHabit(UpdateHabitArgs {
                habit_name: "content".to_string(),
                completed: true,
            })
        );
        assert_eq!(
            validate(&call("rememberFact", json!({"fact": "Has a dog named Rex"}))).unwrap(),
            ValidatedCall::RememberFact(RememberFactArgs {
                fact: "Has a dog named Rex".to_string(),
            })
        );
    }
}
