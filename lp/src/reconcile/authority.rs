//! The authoritative-outcome seam
//!
//! After a mutation is applied locally, the reconciler asks an `Authority`
//! whether it sticks. The authority may be a remote service or a local
//! durable store; it owns its own timeout.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::domain::{DomainState, EntityKey, EntityValue};
use crate::mutation::Mutation;

/// Why the authority did not accept a change
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorityError {
    #[error("rejected by authority: {0}")]
    Rejected(String),

    #[error("authority timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not persist change: {0}")]
    Persistence(String),
}

/// A locally applied change awaiting confirmation
#[derive(Debug, Clone)]
pub struct AppliedChange {
    pub attempt: u64,
    pub key: EntityKey,
    pub mutation: Mutation,
    /// Store state right after the local write
    pub state: DomainState,
}

#[async_trait]
pub trait Authority: Send + Sync {
    /// Confirm a change
    ///
    /// `Ok(Some(value))` carries the authoritative value of the same identity
    /// when it differs from what was applied locally.
    async fn confirm(&self, change: &AppliedChange) -> Result<Option<EntityValue>, AuthorityError>;
}

/// Accepts every change as applied (in-memory only sessions)
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAuthority;

#[async_trait]
impl Authority for LocalAuthority {
    async fn confirm(&self, change: &AppliedChange) -> Result<Option<EntityValue>, AuthorityError> {
        debug!(attempt = change.attempt, key = %change.key, "LocalAuthority::confirm: accepted");
        Ok(None)
    }
}
