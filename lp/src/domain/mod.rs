//! Domain types for LifePilot
//!
//! Core entities: Project, Task, Habit and the fact sequence, gathered in a
//! `DomainState`. Entities are only ever mutated through the store.

mod habit;
mod id;
mod project;
mod role;
mod state;
mod task;

pub use habit::Habit;
pub use id::{generate_id, resolve_id_prefix};
pub use project::{Project, ProjectStatus, ProjectUpdate, Sentiment};
pub use role::Role;
pub use state::{DomainState, Entity, EntityKey, EntityKind, EntityValue};
pub use task::{Priority, Task};
