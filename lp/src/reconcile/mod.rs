//! Optimistic Reconciliation
//!
//! Applies a mutation to the local store right away, then asks an
//! [`Authority`] to confirm it. A failed confirmation restores the exact
//! pre-mutation snapshot of the touched identity.

mod authority;
mod locks;
mod manager;
mod phase;
mod snapshot;

pub use authority::{AppliedChange, Authority, AuthorityError, LocalAuthority};
pub use locks::{KeyGuard, KeyLocks};
pub use manager::{Reconciled, Reconciler};
pub use phase::{Phase, PhaseEvent};
pub use snapshot::Snapshot;
