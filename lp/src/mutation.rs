//! Mutation Executor
//!
//! Pure functions computing the next value of one entity, plus the
//! `Operation` vocabulary the reconciler executes and `plan`, which turns an
//! operation and a snapshot of its target into a concrete store write.
//!
//! Nothing here touches the store except `Mutation::write`.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    Entity, EntityKey, EntityValue, Habit, Project, ProjectStatus, ProjectUpdate, Role, Sentiment, Task, generate_id,
};
use crate::reconcile::Snapshot;
use crate::store::{DomainStore, StoreError};

/// Calendar day of `now` in the user's local time zone
pub fn local_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Local).date_naive()
}

/// New task, medium priority, not completed
pub fn add_task(text: &str, role: Role, project_id: Option<String>, now: DateTime<Utc>) -> Task {
    Task::new(text.trim(), role, project_id, now)
}

pub fn set_task_completed(task: &Task, completed: bool) -> Task {
    Task {
        completed,
        ..task.clone()
    }
}

/// Log a habit for `today`
///
/// Only a false -> true transition grows the streak (by exactly one).
/// Logging an already-done habit again changes nothing, and un-logging
/// clears the flag without touching the streak.
pub fn log_habit(habit: &Habit, completed: bool, today: NaiveDate) -> Habit {
    match (habit.completed_today, completed) {
        (false, true) => Habit {
            completed_today: true,
            streak: habit.streak.saturating_add(1),
            last_completed_on: Some(today),
            ..habit.clone()
        },
        (true, true) => habit.clone(),
        (_, false) => Habit {
            completed_today: false,
            ..habit.clone()
        },
    }
}

/// What an `updateProject` call asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectChange {
    pub content: String,
    /// `None` keeps the current status
    pub status: Option<ProjectStatus>,
    /// `None` (or blank) keeps the current next step
    pub next_step: Option<String>,
}

/// Prepend an update to the project's log and apply the optional overwrites
pub fn record_project_update(project: &Project, change: &ProjectChange, now: DateTime<Utc>) -> Project {
    let update = ProjectUpdate {
        id: generate_id("update", ""),
        timestamp: now,
        content: change.content.clone(),
        sentiment: Sentiment::Neutral,
    };

    let mut updates = Vec::with_capacity(project.updates.len() + 1);
    updates.push(update);
    updates.extend(project.updates.iter().cloned());

    let next_step = match change.next_step.as_deref().map(str::trim) {
        Some(step) if !step.is_empty() => step.to_string(),
        _ => project.next_step.clone(),
    };

    Project {
        status: change.status.unwrap_or(project.status),
        updates,
        next_step,
        ..project.clone()
    }
}

/// Append a fact; the sequence is never reordered or deduplicated
pub fn remember_fact(facts: &[String], fact: &str) -> Vec<String> {
    let mut next = facts.to_vec();
    next.push(fact.trim().to_string());
    next
}

pub fn new_project(name: &str, role: Role, status: ProjectStatus, now: DateTime<Utc>) -> Project {
    Project::new(name.trim(), role, status, now)
}

pub fn new_habit(name: &str, category: &str, now: DateTime<Utc>) -> Habit {
    Habit::new(name.trim(), category.trim(), now)
}

/// A mutation intent against exactly one identity
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    InsertTask(Task),
    InsertProject(Project),
    InsertHabit(Habit),
    SetTaskCompleted { id: String, completed: bool },
    /// Flip completion of a task (manual toggle)
    ToggleTask { id: String },
    DeleteTask { id: String },
    LogHabit { id: String, completed: bool },
    UpdateProject { id: String, change: ProjectChange },
    RememberFact(String),
}

impl Operation {
    /// The identity this operation touches
    pub fn key(&self) -> EntityKey {
        match self {
            Self::InsertTask(t) => EntityKey::Task(t.id.clone()),
            Self::InsertProject(p) => EntityKey::Project(p.id.clone()),
            Self::InsertHabit(h) => EntityKey::Habit(h.id.clone()),
            Self::SetTaskCompleted { id, .. } | Self::ToggleTask { id } | Self::DeleteTask { id } => {
                EntityKey::Task(id.clone())
            }
            Self::LogHabit { id, .. } => EntityKey::Habit(id.clone()),
            Self::UpdateProject { id, .. } => EntityKey::Project(id.clone()),
            Self::RememberFact(_) => EntityKey::Facts,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::InsertTask(_) => "insert-task",
            Self::InsertProject(_) => "insert-project",
            Self::InsertHabit(_) => "insert-habit",
            Self::SetTaskCompleted { .. } => "set-task-completed",
            Self::ToggleTask { .. } => "toggle-task",
            Self::DeleteTask { .. } => "delete-task",
            Self::LogHabit { .. } => "log-habit",
            Self::UpdateProject { .. } => "update-project",
            Self::RememberFact(_) => "remember-fact",
        }
    }
}

/// Why an operation was not applied
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("{0} no longer exists")]
    Vanished(EntityKey),

    #[error("{0} already exists")]
    AlreadyExists(EntityKey),

    #[error("operation does not match snapshot of {0}")]
    KindMismatch(EntityKey),
}

/// A concrete write against one identity
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Insert(EntityValue),
    Replace(EntityValue),
    Remove(EntityKey),
    ReplaceFacts(Arc<Vec<String>>),
}

impl Mutation {
    pub fn key(&self) -> EntityKey {
        match self {
            Self::Insert(value) | Self::Replace(value) => value.key(),
            Self::Remove(key) => key.clone(),
            Self::ReplaceFacts(_) => EntityKey::Facts,
        }
    }

    /// The entity value written, if this write leaves one behind
    pub fn value(&self) -> Option<&EntityValue> {
        match self {
            Self::Insert(value) | Self::Replace(value) => Some(value),
            Self::Remove(_) | Self::ReplaceFacts(_) => None,
        }
    }

    /// Apply to the store; subscribers are notified before this returns
    pub fn write(&self, store: &DomainStore) -> Result<(), SkipReason> {
        debug!(key = %self.key(), "Mutation::write: called");
        match self {
            Self::Insert(value) => {
                let inserted = match value.clone() {
                    EntityValue::Project(p) => store.insert_front(p).map(drop),
                    EntityValue::Task(t) => store.insert_front(t).map(drop),
                    EntityValue::Habit(h) => store.insert_front(h).map(drop),
                };
                inserted.map_err(|e: StoreError| {
                    debug!(error = %e, "Mutation::write: insert refused");
                    SkipReason::AlreadyExists(value.key())
                })
            }
            Self::Replace(value) => {
                let patched = match value {
                    EntityValue::Project(p) => replace(store, p),
                    EntityValue::Task(t) => replace(store, t),
                    EntityValue::Habit(h) => replace(store, h),
                };
                if patched { Ok(()) } else { Err(SkipReason::Vanished(value.key())) }
            }
            Self::Remove(key) => {
                let removed = match key {
                    EntityKey::Project(id) => store.remove::<Project>(id).is_some(),
                    EntityKey::Task(id) => store.remove::<Task>(id).is_some(),
                    EntityKey::Habit(id) => store.remove::<Habit>(id).is_some(),
                    EntityKey::Facts => false,
                };
                if removed { Ok(()) } else { Err(SkipReason::Vanished(key.clone())) }
            }
            Self::ReplaceFacts(facts) => {
                store.replace_facts(Arc::clone(facts));
                Ok(())
            }
        }
    }
}

fn replace<T: Entity>(store: &DomainStore, value: &T) -> bool {
    store.patch::<T, _>(value.id(), |_| value.clone()).is_some()
}

/// Turn an operation into a write, given the target's value before it
///
/// Never panics: a target that is gone (or a mismatched snapshot) is a skip.
pub fn plan(op: &Operation, snapshot: &Snapshot, now: DateTime<Utc>) -> Result<Mutation, SkipReason> {
    let key = op.key();
    debug!(op = op.name(), %key, "plan: called");

    let planned = match (op, snapshot) {
        (Operation::InsertTask(task), Snapshot::Task(None)) => Mutation::Insert(EntityValue::Task(task.clone())),
        (Operation::InsertProject(project), Snapshot::Project(None)) => {
            Mutation::Insert(EntityValue::Project(project.clone()))
        }
        (Operation::InsertHabit(habit), Snapshot::Habit(None)) => Mutation::Insert(EntityValue::Habit(habit.clone())),
        (Operation::InsertTask(_), Snapshot::Task(Some(_)))
        | (Operation::InsertProject(_), Snapshot::Project(Some(_)))
        | (Operation::InsertHabit(_), Snapshot::Habit(Some(_))) => return Err(SkipReason::AlreadyExists(key)),

        (Operation::SetTaskCompleted { completed, .. }, Snapshot::Task(Some(slot))) => {
            Mutation::Replace(EntityValue::Task(set_task_completed(&slot.value, *completed)))
        }
        (Operation::ToggleTask { .. }, Snapshot::Task(Some(slot))) => {
            Mutation::Replace(EntityValue::Task(set_task_completed(&slot.value, !slot.value.completed)))
        }
        (Operation::DeleteTask { .. }, Snapshot::Task(Some(_))) => Mutation::Remove(key),
        (Operation::LogHabit { completed, .. }, Snapshot::Habit(Some(slot))) => {
            Mutation::Replace(EntityValue::Habit(log_habit(&slot.value, *completed, local_today(now))))
        }
        (Operation::UpdateProject { change, .. }, Snapshot::Project(Some(slot))) => {
            Mutation::Replace(EntityValue::Project(record_project_update(&slot.value, change, now)))
        }
        (Operation::RememberFact(fact), Snapshot::Facts(facts)) => {
            Mutation::ReplaceFacts(Arc::new(remember_fact(facts, fact)))
        }

        (
            Operation::SetTaskCompleted { .. } | Operation::ToggleTask { .. } | Operation::DeleteTask { .. },
            Snapshot::Task(None),
        )
        | (Operation::LogHabit { .. }, Snapshot::Habit(None))
        | (Operation::UpdateProject { .. }, Snapshot::Project(None)) => {
            debug!(%key, "plan: target vanished");
            return Err(SkipReason::Vanished(key));
        }

        _ => return Err(SkipReason::KindMismatch(key)),
    };

    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainState;
    use crate::store::Slot;
    use chrono::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
    }

    #[test]
    fn test_log_habit_increments_once() {
        let habit = Habit::new("Record daily video", "content", Utc::now());
        let done = log_habit(&habit, true, day(3));
        assert!(done.completed_today);
        assert_eq!(done.streak, 1);
        assert_eq!(done.last_completed_on, Some(day(3)));

        let again = log_habit(&done, true, day(3));
        assert_eq!(again, done);
    }

    #[test]
    fn test_log_habit_false_keeps_streak() {
        let mut habit = Habit::new("Gym", "health", Utc::now());
        habit.streak = 5;
        habit.completed_today = true;

        let undone = log_habit(&habit, false, day(3));
        assert!(!undone.completed_today);
        assert_eq!(undone.streak, 5);

        let still = log_habit(&undone, false, day(3));
        assert_eq!(still.streak, 5);
    }

    #[test]
    fn test_record_project_update_prepends() {
        let now = Utc::now();
        let project = Project::new("No Excuse Campaign", Role::Founder, ProjectStatus::AtRisk, now);
        let first = record_project_update(
            &project,
            &ProjectChange {
                content: "Kickoff done".to_string(),
                status: None,
                next_step: Some("Draft brief".to_string()),
            },
            now,
        );
        let second = record_project_update(
            &first,
            &ProjectChange {
                content: "Brief approved".to_string(),
                status: Some(ProjectStatus::OnTrack),
                next_step: Some("  ".to_string()),
            },
            now + Duration::minutes(5),
        );

        assert_eq!(first.status, ProjectStatus::AtRisk);
        assert_eq!(first.next_step, "Draft brief");
        assert_eq!(second.status, ProjectStatus::OnTrack);
        assert_eq!(second.next_step, "Draft brief");
        assert_eq!(second.updates.len(), 2);
        assert_eq!(second.updates[0].content, "Brief approved");
        assert_eq!(second.updates[0].sentiment, Sentiment::Neutral);
        assert_eq!(second.updates[1].content, "Kickoff done");
    }

    #[test]
    fn test_remember_fact_appends_without_dedup() {
        let facts = vec!["likes tea".to_string()];
        let next = remember_fact(&facts, " likes tea ");
        assert_eq!(next, vec!["likes tea".to_string(), "likes tea".to_string()]);
    }

    #[test]
    fn test_add_task_defaults() {
        let task = add_task("  Email Sam ", Role::Coo, None, Utc::now());
        assert_eq!(task.text, "Email Sam");
        assert!(!task.completed);
        assert_eq!(task.priority, crate::domain::Priority::Medium);
    }

    #[test]
    fn test_plan_vanished_target_is_skip() {
        let op = Operation::LogHabit {
            id: "gone".to_string(),
            completed: true,
        };
        assert_eq!(
            plan(&op, &Snapshot::Habit(None), Utc::now()),
            Err(SkipReason::Vanished(EntityKey::Habit("gone".to_string())))
        );
    }

    #[test]
    fn test_plan_mismatched_snapshot_is_skip() {
        let op = Operation::RememberFact("x".to_string());
        assert!(matches!(
            plan(&op, &Snapshot::Task(None), Utc::now()),
            Err(SkipReason::KindMismatch(_))
        ));
    }

    #[test]
    fn test_plan_toggle_flips_completion() {
        let task = Task::new("Ship it", Role::Pm, None, Utc::now());
        let op = Operation::ToggleTask { id: task.id.clone() };
        let snapshot = Snapshot::Task(Some(Slot {
            index: 0,
            value: Arc::new(task),
        }));
        match plan(&op, &snapshot, Utc::now()).unwrap() {
            Mutation::Replace(EntityValue::Task(t)) => assert!(t.completed),
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_write_replace_on_missing_is_skip() {
        let store = DomainStore::new(DomainState::default());
        let task = Task::new("Ghost", Role::Personal, None, Utc::now());
        let result = Mutation::Replace(EntityValue::Task(task.clone())).write(&store);
        assert_eq!(result, Err(SkipReason::Vanished(EntityKey::Task(task.id))));
    }

    #[test]
    fn test_write_insert_duplicate_is_skip() {
        let store = DomainStore::default();
        let habit = Habit::new("Read", "learning", Utc::now());
        let mutation = Mutation::Insert(EntityValue::Habit(habit));
        mutation.write(&store).unwrap();
        assert!(matches!(mutation.write(&store), Err(SkipReason::AlreadyExists(_))));
    }
}
