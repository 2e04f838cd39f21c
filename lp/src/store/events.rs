//! Change notifications published by the store

use crate::domain::EntityKey;

/// How a single entity changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Removed,
}

/// Event broadcast on every successful store write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The whole state was replaced via `set`
    Replaced,
    /// Exactly one identity changed; every other entity is untouched
    Changed { key: EntityKey, change: ChangeKind },
}

impl StoreEvent {
    pub fn changed(key: EntityKey, change: ChangeKind) -> Self {
        Self::Changed { key, change }
    }

    /// The identity this event is about, if it is a fine-grained change
    pub fn key(&self) -> Option<&EntityKey> {
        match self {
            Self::Replaced => None,
            Self::Changed { key, .. } => Some(key),
        }
    }
}
