//! Phase observation events

use crate::domain::EntityKey;

/// Where one reconciliation attempt is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Snapshotted,
    AppliedLocally,
    Committed,
    RolledBack,
    Skipped,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack | Self::Skipped)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Snapshotted => "snapshotted",
            Self::AppliedLocally => "applied-locally",
            Self::Committed => "committed",
            Self::RolledBack => "rolled-back",
            Self::Skipped => "skipped",
        };
        write!(f, "{}", name)
    }
}

/// Published on every phase transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseEvent {
    pub attempt: u64,
    pub key: EntityKey,
    pub phase: Phase,
}
