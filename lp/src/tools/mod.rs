//! Tool system for the assistant
//!
//! The intent resolver proposes tool calls by name with JSON arguments. Each
//! call is checked against its declared schema and turned into a typed
//! `ValidatedCall` before anything touches the store.

mod call;
mod error;
pub mod schema;
mod validator;

pub use call::{ManageTaskArgs, RememberFactArgs, TaskAction, UpdateHabitArgs, UpdateProjectArgs, ValidatedCall};
pub use error::ToolError;
pub use schema::{FieldKind, FieldSpec, ToolSchema, definitions, schema_for};
pub use validator::validate;
