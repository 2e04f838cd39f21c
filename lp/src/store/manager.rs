//! DomainStore - shared handle over the in-memory state
//!
//! Reads and writes are synchronous and never held across an `.await`, so a
//! single store call is atomic from every caller's point of view.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::domain::{DomainState, Entity, EntityKey, Habit};

use super::events::{ChangeKind, StoreEvent};

/// Capacity of the change notification channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Errors from store writes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Entity already exists: {0}")]
    DuplicateId(String),
}

/// An entity together with its position in its collection
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<T> {
    pub index: usize,
    pub value: Arc<T>,
}

/// Handle to the shared domain state
#[derive(Clone)]
pub struct DomainStore {
    state: Arc<RwLock<DomainState>>,
    event_tx: broadcast::Sender<StoreEvent>,
}

impl DomainStore {
    /// Create a store seeded with `state`
    pub fn new(state: DomainState) -> Self {
        debug!(
            projects = state.projects.len(),
            tasks = state.tasks.len(),
            habits = state.habits.len(),
            facts = state.facts.len(),
            "DomainStore::new: called"
        );
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(state)),
            event_tx,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, DomainState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DomainState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // Sent while the write guard is held so event order matches write order.
    // No subscribers is fine.
    fn notify(&self, event: StoreEvent) {
        debug!(?event, "DomainStore::notify");
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        debug!("DomainStore::subscribe: new subscriber");
        self.event_tx.subscribe()
    }

    /// Current state (entities are shared, so this is cheap)
    pub fn get(&self) -> DomainState {
        self.read().clone()
    }

    /// Replace the whole state and notify subscribers
    pub fn set(&self, next: DomainState) {
        debug!("DomainStore::set: called");
        let mut state = self.write();
        *state = next;
        self.notify(StoreEvent::Replaced);
    }

    /// Look up one entity by ID
    pub fn find<T: Entity>(&self, id: &str) -> Option<Arc<T>> {
        self.read().find::<T>(id).cloned()
    }

    /// Look up one entity and its position by ID
    pub fn slot<T: Entity>(&self, id: &str) -> Option<Slot<T>> {
        let state = self.read();
        let collection = T::collection(&state);
        collection
            .iter()
            .position(|e| e.id() == id)
            .map(|index| Slot {
                index,
                value: Arc::clone(&collection[index]),
            })
    }

    /// Apply `updater` to exactly one entity by identity
    ///
    /// Every other entity keeps its `Arc` untouched. Returns `None` (and
    /// notifies nobody) when no entity has that ID.
    pub fn patch<T, F>(&self, id: &str, updater: F) -> Option<Arc<T>>
    where
        T: Entity,
        F: FnOnce(&T) -> T,
    {
        debug!(kind = %T::KIND, %id, "DomainStore::patch: called");
        let mut state = self.write();
        let collection = T::collection_mut(&mut state);
        let Some(index) = collection.iter().position(|e| e.id() == id) else {
            debug!(kind = %T::KIND, %id, "DomainStore::patch: not found");
            return None;
        };

        let next = Arc::new(updater(&collection[index]));
        collection[index] = Arc::clone(&next);
        self.notify(StoreEvent::changed(T::key_for(id), ChangeKind::Updated));
        Some(next)
    }

    /// Insert a new entity at the front of its collection
    pub fn insert_front<T: Entity>(&self, entity: T) -> Result<Arc<T>, StoreError> {
        debug!(kind = %T::KIND, id = %entity.id(), "DomainStore::insert_front: called");
        let mut state = self.write();
        let collection = T::collection_mut(&mut state);
        if collection.iter().any(|e| e.id() == entity.id()) {
            return Err(StoreError::DuplicateId(entity.id().to_string()));
        }

        let key = T::key_for(entity.id());
        let entity = Arc::new(entity);
        collection.insert(0, Arc::clone(&entity));
        self.notify(StoreEvent::changed(key, ChangeKind::Inserted));
        Ok(entity)
    }

    /// Remove an entity, returning it with the position it held
    pub fn remove<T: Entity>(&self, id: &str) -> Option<Slot<T>> {
        debug!(kind = %T::KIND, %id, "DomainStore::remove: called");
        let mut state = self.write();
        let collection = T::collection_mut(&mut state);
        let index = collection.iter().position(|e| e.id() == id)?;
        let value = collection.remove(index);
        self.notify(StoreEvent::changed(T::key_for(id), ChangeKind::Removed));
        Some(Slot { index, value })
    }

    /// Put an identity back exactly as a snapshot recorded it
    ///
    /// `Some(slot)` puts the recorded value back (in place if the entity still
    /// exists, otherwise re-inserted at its old position). `None` means the
    /// entity did not exist, so it is removed if present.
    pub fn restore<T: Entity>(&self, id: &str, snapshot: Option<Slot<T>>) {
        debug!(kind = %T::KIND, %id, present = snapshot.is_some(), "DomainStore::restore: called");
        let mut state = self.write();
        let collection = T::collection_mut(&mut state);
        let current = collection.iter().position(|e| e.id() == id);

        let change = match (snapshot, current) {
            (Some(slot), Some(index)) => {
                collection[index] = slot.value;
                Some(ChangeKind::Updated)
            }
            (Some(slot), None) => {
                let index = slot.index.min(collection.len());
                collection.insert(index, slot.value);
                Some(ChangeKind::Inserted)
            }
            (None, Some(index)) => {
                collection.remove(index);
                Some(ChangeKind::Removed)
            }
            (None, None) => None,
        };

        if let Some(change) = change {
            self.notify(StoreEvent::changed(T::key_for(id), change));
        }
    }

    /// The fact sequence
    pub fn facts(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.read().facts)
    }

    /// Replace the fact sequence
    pub fn replace_facts(&self, facts: Arc<Vec<String>>) {
        debug!(count = facts.len(), "DomainStore::replace_facts: called");
        let mut state = self.write();
        state.facts = facts;
        self.notify(StoreEvent::changed(EntityKey::Facts, ChangeKind::Updated));
    }

    /// Clear completed-today on habits last logged before `today`
    ///
    /// Returns the number of habits that rolled over.
    pub fn roll_over(&self, today: NaiveDate) -> usize {
        debug!(%today, "DomainStore::roll_over: called");
        let stale: Vec<String> = self
            .read()
            .habits
            .iter()
            .filter(|h| h.rolled_over(today).is_some())
            .map(|h| h.id.clone())
            .collect();

        let mut count = 0;
        for id in &stale {
            let patched = self.patch::<Habit, _>(id, |h| h.rolled_over(today).unwrap_or_else(|| h.clone()));
            if patched.is_some() {
                count += 1;
            }
        }

        if count > 0 {
            info!(count, %today, "Rolled habits over to a new day");
        }
        count
    }
}

impl Default for DomainStore {
    fn default() -> Self {
        Self::new(DomainState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Project, ProjectStatus, Role, Task};
    use chrono::Utc;

    fn task(text: &str) -> Task {
        Task::new(text, Role::Personal, None, Utc::now())
    }

    fn store_with_tasks(texts: &[&str]) -> (DomainStore, Vec<String>) {
        let tasks: Vec<Task> = texts.iter().map(|t| task(t)).collect();
        let ids = tasks.iter().map(|t| t.id.clone()).collect();
        let state = DomainState {
            tasks: tasks.into_iter().map(Arc::new).collect(),
            ..Default::default()
        };
        (DomainStore::new(state), ids)
    }

    #[test]
    fn test_patch_updates_only_target() {
        let (store, ids) = store_with_tasks(&["a", "b", "c"]);
        let before = store.get();

        let patched = store.patch::<Task, _>(&ids[1], |t| Task {
            completed: true,
            ..t.clone()
        });
        assert!(patched.unwrap().completed);

        let after = store.get();
        assert!(Arc::ptr_eq(&before.tasks[0], &after.tasks[0]));
        assert!(!Arc::ptr_eq(&before.tasks[1], &after.tasks[1]));
        assert!(Arc::ptr_eq(&before.tasks[2], &after.tasks[2]));
    }

    #[test]
    fn test_patch_missing_is_noop() {
        let (store, _) = store_with_tasks(&["a"]);
        let mut rx = store.subscribe();
        let before = store.get();

        let result = store.patch::<Task, _>("nope", |t| t.clone());
        assert!(result.is_none());
        assert_eq!(store.get(), before);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_notification_is_queued_before_return() {
        let (store, ids) = store_with_tasks(&["a"]);
        let mut rx = store.subscribe();

        store.patch::<Task, _>(&ids[0], |t| t.clone());

        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::changed(EntityKey::Task(ids[0].clone()), ChangeKind::Updated)
        );
    }

    #[test]
    fn test_set_replaces_and_notifies() {
        let store = DomainStore::default();
        let mut rx = store.subscribe();
        let (other, _) = store_with_tasks(&["x"]);

        store.set(other.get());

        assert_eq!(store.get().tasks.len(), 1);
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::Replaced);
    }

    #[test]
    fn test_insert_front_and_duplicate() {
        let (store, _) = store_with_tasks(&["a"]);
        let t = task("b");
        let id = t.id.clone();

        store.insert_front(t.clone()).unwrap();
        assert_eq!(store.get().tasks[0].id, id);
        assert_eq!(store.insert_front(t).unwrap_err(), StoreError::DuplicateId(id));
    }

    #[test]
    fn test_remove_then_restore_puts_back_in_place() {
        let (store, ids) = store_with_tasks(&["a", "b", "c"]);
        let before = store.get();

        let slot = store.remove::<Task>(&ids[1]).unwrap();
        assert_eq!(slot.index, 1);
        assert_eq!(store.get().tasks.len(), 2);

        store.restore::<Task>(&ids[1], Some(slot));
        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_restore_none_removes_inserted() {
        let (store, _) = store_with_tasks(&["a"]);
        let before = store.get();
        let t = task("new");
        let id = t.id.clone();
        store.insert_front(t).unwrap();

        store.restore::<Task>(&id, None);
        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_restore_replaces_patched_value() {
        let now = Utc::now();
        let project = Project::new("Alpha", Role::Pm, ProjectStatus::OnTrack, now);
        let id = project.id.clone();
        let store = DomainStore::new(DomainState {
            projects: vec![Arc::new(project)],
            ..Default::default()
        });
        let snapshot = store.slot::<Project>(&id);
        let before = store.get();

        store.patch::<Project, _>(&id, |p| Project {
            status: ProjectStatus::Delayed,
            ..p.clone()
        });
        store.restore(&id, snapshot);

        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_replace_facts_notifies() {
        let store = DomainStore::default();
        let mut rx = store.subscribe();
        store.replace_facts(Arc::new(vec!["likes tea".to_string()]));
        assert_eq!(store.facts().as_slice(), ["likes tea".to_string()]);
        assert_eq!(rx.try_recv().unwrap().key(), Some(&EntityKey::Facts));
    }

    #[test]
    fn test_roll_over_clears_stale_habits() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 2).unwrap();
        let mut stale = Habit::new("Run", "health", Utc::now());
        stale.completed_today = true;
        stale.streak = 3;
        stale.last_completed_on = NaiveDate::from_ymd_opt(2026, 5, 1);
        let mut fresh = Habit::new("Read", "learning", Utc::now());
        fresh.completed_today = true;
        fresh.last_completed_on = Some(today);

        let store = DomainStore::new(DomainState {
            habits: vec![Arc::new(stale), Arc::new(fresh)],
            ..Default::default()
        });

        assert_eq!(store.roll_over(today), 1);
        let state = store.get();
        assert!(!state.habits[0].completed_today);
        assert_eq!(state.habits[0].streak, 3);
        assert!(state.habits[1].completed_today);
    }
}
