//! Entity Resolver
//!
//! Maps a loosely worded name ("the no excuse project") to exactly one entity,
//! or reports that the reference is ambiguous or matches nothing.
//!
//! Matching is case-insensitive substring containment of the query in any of
//! the entity's search keys. When several candidates match:
//! 1. a single exact (case-insensitive) match wins outright;
//! 2. otherwise the result is `Ambiguous`, with the matches ordered most
//!    recently created first and then by store order. `preferred()` is the
//!    head of that ordering.

use std::sync::Arc;

use tracing::debug;

use crate::domain::Entity;

/// Outcome of resolving a name against a candidate set
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Unique(Arc<T>),
    /// Two or more matches, in tie-break order
    Ambiguous(Vec<Arc<T>>),
    NotFound,
}

impl<T: Entity> Resolution<T> {
    /// The tie-break pick: the unique match, or the head of an ambiguous set
    pub fn preferred(&self) -> Option<&Arc<T>> {
        match self {
            Self::Unique(entity) => Some(entity),
            Self::Ambiguous(matches) => matches.first(),
            Self::NotFound => None,
        }
    }

    /// Display labels of every match
    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::Unique(entity) => vec![entity.label().to_string()],
            Self::Ambiguous(matches) => matches.iter().map(|e| e.label().to_string()).collect(),
            Self::NotFound => Vec::new(),
        }
    }
}

/// Resolve `query` against `candidates` (given in store iteration order)
pub fn resolve<T: Entity>(query: &str, candidates: &[Arc<T>]) -> Resolution<T> {
    let needle = query.trim().to_lowercase();
    debug!(kind = %T::KIND, %needle, candidates = candidates.len(), "resolve: called");

    if needle.is_empty() {
        debug!("resolve: empty query");
        return Resolution::NotFound;
    }

    let matches: Vec<&Arc<T>> = candidates
        .iter()
        .filter(|c| c.search_keys().iter().any(|k| k.to_lowercase().contains(&needle)))
        .collect();

    match matches.len() {
        0 => {
            debug!("resolve: no match");
            return Resolution::NotFound;
        }
        1 => {
            debug!(id = %matches[0].id(), "resolve: single match");
            return Resolution::Unique(Arc::clone(matches[0]));
        }
        _ => {}
    }

    let exact: Vec<&Arc<T>> = matches
        .iter()
        .copied()
        .filter(|c| c.search_keys().iter().any(|k| k.trim().to_lowercase() == needle))
        .collect();

    if exact.len() == 1 {
        debug!(id = %exact[0].id(), "resolve: exact match wins");
        return Resolution::Unique(Arc::clone(exact[0]));
    }

    let pool = if exact.is_empty() { matches } else { exact };
    let mut ranked: Vec<Arc<T>> = pool.into_iter().cloned().collect();
    // Stable sort keeps store order among equal timestamps
    ranked.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

    debug!(count = ranked.len(), "resolve: ambiguous");
    Resolution::Ambiguous(ranked)
}
