//! Domain State Store
//!
//! The single in-memory source of truth for projects, tasks, habits and facts.
//! Every write notifies subscribers synchronously, before the call returns, so
//! an optimistic writer can rely on observers seeing the change first.

mod events;
mod manager;

pub use events::{ChangeKind, StoreEvent};
pub use manager::{DomainStore, Slot, StoreError};
