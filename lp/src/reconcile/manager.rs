//! Reconciler - optimistic apply, confirm, commit or roll back
//!
//! Each attempt runs `Idle -> Snapshotted -> AppliedLocally -> Committed |
//! RolledBack`, or ends `Skipped` when its target is gone. Attempts on the
//! same identity run one at a time in arrival order; disjoint identities run
//! concurrently.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::{EntityKey, EntityValue};
use crate::mutation::{Mutation, Operation, SkipReason, plan};
use crate::store::DomainStore;

use super::authority::{AppliedChange, Authority, AuthorityError};
use super::locks::KeyLocks;
use super::phase::{Phase, PhaseEvent};
use super::snapshot::Snapshot;

const PHASE_CHANNEL_CAPACITY: usize = 1024;

/// Final outcome of one attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    /// The change stuck; `corrected` is set when the authority's value
    /// replaced the optimistic one
    Committed {
        key: EntityKey,
        mutation: Mutation,
        corrected: bool,
    },
    /// The authority failed; the identity is back to its snapshot
    RolledBack { key: EntityKey, error: AuthorityError },
    /// Nothing was applied
    Skipped { key: EntityKey, reason: SkipReason },
}

impl Reconciled {
    pub fn key(&self) -> &EntityKey {
        match self {
            Self::Committed { key, .. } | Self::RolledBack { key, .. } | Self::Skipped { key, .. } => key,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Runs operations against the store with optimistic reconciliation
#[derive(Clone)]
pub struct Reconciler {
    store: DomainStore,
    authority: Arc<dyn Authority>,
    locks: Arc<KeyLocks>,
    phase_tx: broadcast::Sender<PhaseEvent>,
    attempts: Arc<AtomicU64>,
}

impl Reconciler {
    pub fn new(store: DomainStore, authority: Arc<dyn Authority>) -> Self {
        debug!("Reconciler::new: called");
        let (phase_tx, _) = broadcast::channel(PHASE_CHANNEL_CAPACITY);
        Self {
            store,
            authority,
            locks: Arc::new(KeyLocks::new()),
            phase_tx,
            attempts: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn store(&self) -> &DomainStore {
        &self.store
    }

    /// Subscribe to phase transitions of every attempt
    pub fn subscribe(&self) -> broadcast::Receiver<PhaseEvent> {
        self.phase_tx.subscribe()
    }

    fn phase(&self, attempt: u64, key: &EntityKey, phase: Phase) {
        debug!(attempt, %key, %phase, "Reconciler: phase");
        let _ = self.phase_tx.send(PhaseEvent {
            attempt,
            key: key.clone(),
            phase,
        });
    }

    /// Run one operation through the full reconciliation cycle
    pub async fn reconcile(&self, op: Operation) -> Reconciled {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed);
        let key = op.key();
        debug!(attempt, %key, op = op.name(), "reconcile: called");
        self.phase(attempt, &key, Phase::Idle);

        let _guard = self.locks.acquire(&key).await;

        // Re-read by identity only after the lock is held
        let snapshot = Snapshot::capture(&self.store, &key);
        self.phase(attempt, &key, Phase::Snapshotted);

        let mutation = match plan(&op, &snapshot, Utc::now()) {
            Ok(mutation) => mutation,
            Err(reason) => return self.skip(attempt, key, reason),
        };

        if let Err(reason) = mutation.write(&self.store) {
            return self.skip(attempt, key, reason);
        }
        self.phase(attempt, &key, Phase::AppliedLocally);

        let change = AppliedChange {
            attempt,
            key: key.clone(),
            mutation,
            state: self.store.get(),
        };

        match self.authority.confirm(&change).await {
            Ok(authoritative) => {
                let corrected = self.apply_authoritative(&change, authoritative);
                info!(attempt, %key, op = op.name(), corrected, "Committed change");
                self.phase(attempt, &key, Phase::Committed);
                Reconciled::Committed {
                    key,
                    mutation: change.mutation,
                    corrected,
                }
            }
            Err(error) => {
                warn!(attempt, %key, op = op.name(), %error, "Authority failed, rolling back");
                snapshot.restore(&self.store, &key);
                self.phase(attempt, &key, Phase::RolledBack);
                Reconciled::RolledBack { key, error }
            }
        }
    }

    fn skip(&self, attempt: u64, key: EntityKey, reason: SkipReason) -> Reconciled {
        info!(attempt, %key, %reason, "Skipped change");
        self.phase(attempt, &key, Phase::Skipped);
        Reconciled::Skipped { key, reason }
    }

    /// Overwrite the optimistic value when the authority disagrees
    fn apply_authoritative(&self, change: &AppliedChange, authoritative: Option<EntityValue>) -> bool {
        let Some(value) = authoritative else {
            return false;
        };

        if value.key() != change.key {
            warn!(
                key = %change.key,
                returned = %value.key(),
                "apply_authoritative: authority returned a different identity, ignoring"
            );
            return false;
        }

        if change.mutation.value() == Some(&value) {
            return false;
        }

        debug!(key = %change.key, "apply_authoritative: replacing optimistic value");
        match Mutation::Replace(value).write(&self.store) {
            Ok(()) => true,
            Err(reason) => {
                warn!(key = %change.key, %reason, "apply_authoritative: could not apply");
                false
            }
        }
    }
}
