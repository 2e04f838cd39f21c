//! Reconciliation snapshots

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{EntityKey, Habit, Project, Task};
use crate::store::{DomainStore, Slot};

/// The value of one identity (with its position) just before a write
///
/// `None` records that the entity did not exist, so restoring it removes
/// whatever the write inserted.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Project(Option<Slot<Project>>),
    Task(Option<Slot<Task>>),
    Habit(Option<Slot<Habit>>),
    Facts(Arc<Vec<String>>),
}

impl Snapshot {
    /// Record the current value of `key`
    pub fn capture(store: &DomainStore, key: &EntityKey) -> Self {
        debug!(%key, "Snapshot::capture: called");
        match key {
            EntityKey::Project(id) => Self::Project(store.slot::<Project>(id)),
            EntityKey::Task(id) => Self::Task(store.slot::<Task>(id)),
            EntityKey::Habit(id) => Self::Habit(store.slot::<Habit>(id)),
            EntityKey::Facts => Self::Facts(store.facts()),
        }
    }

    /// Put `key` back exactly as captured
    pub fn restore(self, store: &DomainStore, key: &EntityKey) {
        debug!(%key, "Snapshot::restore: called");
        match (self, key) {
            (Self::Project(slot), EntityKey::Project(id)) => store.restore(id, slot),
            (Self::Task(slot), EntityKey::Task(id)) => store.restore(id, slot),
            (Self::Habit(slot), EntityKey::Habit(id)) => store.restore(id, slot),
            (Self::Facts(facts), EntityKey::Facts) => store.replace_facts(facts),
            (snapshot, key) => {
                warn!(%key, ?snapshot, "Snapshot::restore: snapshot does not belong to key, ignoring");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainState, Role};
    use chrono::Utc;

    #[test]
    fn test_capture_missing_records_absence() {
        let store = DomainStore::default();
        let snapshot = Snapshot::capture(&store, &EntityKey::Task("nope".to_string()));
        assert_eq!(snapshot, Snapshot::Task(None));
    }

    #[test]
    fn test_capture_and_restore_facts() {
        let store = DomainStore::new(DomainState {
            facts: Arc::new(vec!["a".to_string()]),
            ..Default::default()
        });
        let before = store.get();
        let snapshot = Snapshot::capture(&store, &EntityKey::Facts);

        store.replace_facts(Arc::new(vec!["a".to_string(), "b".to_string()]));
        snapshot.restore(&store, &EntityKey::Facts);

        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_restore_with_wrong_key_is_ignored() {
        let task = Task::new("Keep me", Role::Personal, None, Utc::now());
        let id = task.id.clone();
        let store = DomainStore::new(DomainState {
            tasks: vec![Arc::new(task)],
            ..Default::default()
        });
        let before = store.get();

        Snapshot::Habit(None).restore(&store, &EntityKey::Task(id));
        assert_eq!(store.get(), before);
    }
}
