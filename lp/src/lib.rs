//! LifePilot - Conversational Productivity Assistant
//!
//! LifePilot turns free-form messages ("I recorded my video today", "the No
//! Excuse launch slipped a week") into precise changes to a small personal
//! database of projects, tasks, habits and remembered facts.
//!
//! # Core Concepts
//!
//! - **Validated Tool Calls**: The assistant proposes calls; each one is
//!   schema-checked before it can touch state
//! - **Loose Names, Exact Targets**: Names resolve to exactly one entity or
//!   the call is refused with the candidates
//! - **Optimistic Writes**: Changes show up immediately and are rolled back to
//!   an exact snapshot if the save fails
//! - **Independent Calls**: One failing call never undoes or blocks another
//!
//! # Modules
//!
//! - [`domain`] - Projects, tasks, habits, facts and their identities
//! - [`store`] - In-memory state with change notifications
//! - [`resolver`] - Name to entity resolution
//! - [`tools`] - Tool schemas and call validation
//! - [`mutation`] - Pure state transitions and the operation vocabulary
//! - [`reconcile`] - Optimistic apply, confirm, commit or roll back
//! - [`persistence`] - JSON state file and the saving authority
//! - [`intent`] - Utterance to tool calls
//! - [`assistant`] - Turn orchestration and chat sessions
//! - [`llm`] - LLM client trait and Anthropic implementation
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod assistant;
pub mod cli;
pub mod config;
pub mod domain;
pub mod intent;
pub mod llm;
pub mod mutation;
pub mod persistence;
pub mod reconcile;
pub mod render;
pub mod repl;
pub mod resolver;
pub mod store;
pub mod tools;

// Re-export commonly used types
pub use assistant::{CallFailure, CallOutcome, ChatSession, Committed, TurnController, TurnResult};
pub use config::{AmbiguityPolicy, Config, LlmConfig};
pub use domain::{DomainState, Entity, EntityKey, EntityKind, Habit, Project, ProjectStatus, Role, Task};
pub use intent::{IntentRequest, IntentResolver, IntentResponse, LlmIntentResolver, OfflineResolver, ResolverError};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError};
pub use mutation::{Operation, SkipReason};
pub use persistence::{JsonFileRepository, PersistenceAuthority, PersistenceError, StateRepository};
pub use reconcile::{Authority, AuthorityError, LocalAuthority, Phase, PhaseEvent, Reconciled, Reconciler};
pub use resolver::{Resolution, resolve};
pub use store::{DomainStore, StoreEvent};
pub use tools::{ToolError, ValidatedCall};
