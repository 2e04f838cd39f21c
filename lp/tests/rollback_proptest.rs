//! Property tests: a rejected change leaves no trace

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use proptest::prelude::*;

use lifepilot::domain::{DomainState, EntityValue, Habit, Project, ProjectStatus, Role, Task};
use lifepilot::mutation::{Operation, ProjectChange};
use lifepilot::reconcile::{AppliedChange, Authority, AuthorityError, Reconciled, Reconciler};
use lifepilot::store::DomainStore;

struct RejectAll;

#[async_trait]
impl Authority for RejectAll {
    async fn confirm(&self, _change: &AppliedChange) -> Result<Option<EntityValue>, AuthorityError> {
        Err(AuthorityError::Rejected("nope".to_string()))
    }
}

fn seed(tasks: usize, habits: usize, projects: usize, completed: bool) -> DomainState {
    let now = Utc::now();
    DomainState {
        tasks: (0..tasks)
            .map(|i| {
                let mut task = Task::new(format!("task {}", i), Role::Personal, None, now);
                task.completed = completed && i % 2 == 0;
                Arc::new(task)
            })
            .collect(),
        habits: (0..habits)
            .map(|i| {
                let mut habit = Habit::new(format!("habit {}", i), "health", now);
                habit.streak = i as u32;
                habit.completed_today = completed;
                Arc::new(habit)
            })
            .collect(),
        projects: (0..projects)
            .map(|i| Arc::new(Project::new(format!("project {}", i), Role::Pm, ProjectStatus::OnTrack, now)))
            .collect(),
        facts: Arc::new(vec!["likes tea".to_string()]),
    }
}

#[derive(Debug, Clone)]
enum Pick {
    Toggle(usize),
    Delete(usize),
    Log(usize, bool),
    Update(usize, Option<ProjectStatus>, String),
    Fact(String),
    Add(String),
}

fn pick_strategy() -> impl Strategy<Value = Pick> {
    let status = prop_oneof![
        Just(None),
        Just(Some(ProjectStatus::AtRisk)),
        Just(Some(ProjectStatus::Delayed)),
        Just(Some(ProjectStatus::Completed)),
    ];
    prop_oneof![
        (0usize..5).prop_map(Pick::Toggle),
        (0usize..5).prop_map(Pick::Delete),
        (0usize..5, any::<bool>()).prop_map(|(i, b)| Pick::Log(i, b)),
        (0usize..5, status, "[a-z ]{1,20}").prop_map(|(i, s, c)| Pick::Update(i, s, c)),
        "[a-z ]{1,20}".prop_map(Pick::Fact),
        "[a-z ]{1,20}".prop_map(Pick::Add),
    ]
}

fn operation(pick: &Pick, state: &DomainState) -> Option<Operation> {
    match pick {
        Pick::Toggle(i) => state.tasks.get(*i).map(|t| Operation::ToggleTask { id: t.id.clone() }),
        Pick::Delete(i) => state.tasks.get(*i).map(|t| Operation::DeleteTask { id: t.id.clone() }),
        Pick::Log(i, completed) => state.habits.get(*i).map(|h| Operation::LogHabit {
            id: h.id.clone(),
            completed: *completed,
        }),
        Pick::Update(i, status, content) => state.projects.get(*i).map(|p| Operation::UpdateProject {
            id: p.id.clone(),
            change: ProjectChange {
                content: content.clone(),
                status: *status,
                next_step: Some("ship it".to_string()),
            },
        }),
        Pick::Fact(fact) => Some(Operation::RememberFact(fact.clone())),
        Pick::Add(text) => Some(Operation::InsertTask(Task::new(
            text.clone(),
            Role::Personal,
            None,
            Utc::now(),
        ))),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rejected_changes_restore_exact_state(
        tasks in 0usize..5,
        habits in 0usize..5,
        projects in 0usize..5,
        completed in any::<bool>(),
        picks in prop::collection::vec(pick_strategy(), 1..8),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let initial = seed(tasks, habits, projects, completed);
        let store = DomainStore::new(initial.clone());
        let reconciler = Reconciler::new(store.clone(), Arc::new(RejectAll));

        for pick in &picks {
            let Some(op) = operation(pick, &store.get()) else {
                continue;
            };
            let result = runtime.block_on(reconciler.reconcile(op));
            prop_assert!(!result.is_committed());
            // Skips are fine (e.g. logging a habit already done); anything
            // else must have been rolled back
            prop_assert!(
                matches!(result, Reconciled::RolledBack { .. } | Reconciled::Skipped { .. }),
                "expected RolledBack or Skipped"
            );
            prop_assert_eq!(&store.get(), &initial);
        }
    }
}
