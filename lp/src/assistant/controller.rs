//! Conversational Turn Controller
//!
//! One turn: ask the intent resolver, then run each proposed tool call in
//! order (validate, resolve its target against fresh state, reconcile), then
//! assemble the reply. A failed call never stops the calls after it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::AmbiguityPolicy;
use crate::domain::{Entity, EntityKey, Habit, Project, ProjectStatus, Role, Task};
use crate::intent::{IntentRequest, IntentResolver};
use crate::llm::{Message, ToolCall};
use crate::mutation::{self, Operation, ProjectChange};
use crate::reconcile::{Reconciled, Reconciler};
use crate::resolver::{Resolution, resolve};
use crate::store::DomainStore;
use crate::tools::{self, ManageTaskArgs, TaskAction, ValidatedCall};

use super::outcome::{CallFailure, CallOutcome, Committed, TurnError, TurnResult, describe, synthesize};

/// Where a turn is; logged as it moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    ResolvingIntent,
    ExecutingCalls(usize),
    Synthesizing,
}

pub struct TurnController {
    reconciler: Reconciler,
    resolver: Arc<dyn IntentResolver>,
    ambiguity: AmbiguityPolicy,
}

impl TurnController {
    pub fn new(reconciler: Reconciler, resolver: Arc<dyn IntentResolver>, ambiguity: AmbiguityPolicy) -> Self {
        debug!(?ambiguity, "TurnController::new: called");
        Self {
            reconciler,
            resolver,
            ambiguity,
        }
    }

    pub fn store(&self) -> &DomainStore {
        self.reconciler.store()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    fn enter(&self, phase: TurnPhase) {
        debug!(?phase, "TurnController: phase");
    }

    /// Handle one user utterance
    pub async fn handle_turn(&self, history: &[Message], utterance: &str) -> TurnResult {
        debug!(history = history.len(), %utterance, "handle_turn: called");
        let today = mutation::local_today(Utc::now());
        self.store().roll_over(today);

        self.enter(TurnPhase::ResolvingIntent);
        let request = IntentRequest {
            history: history.to_vec(),
            utterance: utterance.to_string(),
            state_summary: self.store().get().summary(),
            tools: tools::definitions(),
            today,
        };

        let response = match self.resolver.resolve(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Intent resolver failed, turn aborted");
                self.enter(TurnPhase::Idle);
                return TurnResult::aborted(TurnError::ResolverUnavailable(e.to_string()));
            }
        };

        let mut outcomes = Vec::with_capacity(response.tool_calls.len());
        for (index, call) in response.tool_calls.iter().enumerate() {
            self.enter(TurnPhase::ExecutingCalls(index));
            outcomes.push(self.execute_call(call).await);
        }

        self.enter(TurnPhase::Synthesizing);
        let reply_text = synthesize(&response.reply_text, &outcomes);
        let committed = outcomes.iter().filter(|o| o.is_committed()).count();
        info!(calls = outcomes.len(), committed, "Turn complete");

        self.enter(TurnPhase::Idle);
        TurnResult {
            reply_text,
            outcomes,
            aborted: None,
        }
    }

    async fn execute_call(&self, call: &ToolCall) -> CallOutcome {
        debug!(tool = %call.name, id = %call.id, "execute_call: called");
        let result = match tools::validate(call) {
            Ok(validated) => self.execute(validated).await,
            Err(e) => {
                info!(tool = %call.name, error = %e, "Tool call rejected");
                Err(CallFailure::ValidationRejected(e))
            }
        };

        if let Err(failure) = &result {
            debug!(tool = %call.name, %failure, "execute_call: did not commit");
        }
        CallOutcome {
            call_id: call.id.clone(),
            tool: call.name.clone(),
            result,
        }
    }

    async fn execute(&self, call: ValidatedCall) -> Result<Committed, CallFailure> {
        let (op, label) = self.operation_for(call)?;
        self.run(op, &label).await
    }

    /// Resolve a loosely named target against the current state
    fn pick<T: Entity>(&self, query: &str) -> Result<Arc<T>, CallFailure> {
        let state = self.store().get();
        let resolution = resolve::<T>(query, T::collection(&state));

        match (resolution, self.ambiguity) {
            (Resolution::Unique(entity), _) => Ok(entity),
            (Resolution::NotFound, _) => Err(CallFailure::ResolutionNotFound {
                kind: T::KIND,
                query: query.to_string(),
            }),
            (ambiguous @ Resolution::Ambiguous(_), AmbiguityPolicy::PreferRecent) => {
                let picked = ambiguous.preferred().cloned();
                debug!(kind = %T::KIND, %query, candidates = ?ambiguous.labels(), "pick: taking most recent");
                picked.ok_or_else(|| CallFailure::ResolutionNotFound {
                    kind: T::KIND,
                    query: query.to_string(),
                })
            }
            (ambiguous @ Resolution::Ambiguous(_), AmbiguityPolicy::Reject) => Err(CallFailure::ResolutionAmbiguous {
                kind: T::KIND,
                query: query.to_string(),
                candidates: ambiguous.labels(),
            }),
        }
    }

    /// Map a validated call to an operation on one identity
    fn operation_for(&self, call: ValidatedCall) -> Result<(Operation, String), CallFailure> {
        let now = Utc::now();
        match call {
            ValidatedCall::ManageTask(ManageTaskArgs {
                action: TaskAction::Add,
                task_text,
                role,
                project_name,
            }) => {
                let project = match project_name {
                    Some(name) => Some(self.pick::<Project>(&name)?),
                    None => None,
                };
                let role = role.or(project.as_ref().map(|p| p.role)).unwrap_or_default();
                let task = mutation::add_task(&task_text, role, project.map(|p| p.id.clone()), now);
                Ok((Operation::InsertTask(task), task_text))
            }
            ValidatedCall::ManageTask(ManageTaskArgs {
                action: TaskAction::Complete,
                task_text,
                ..
            }) => {
                let task = self.pick::<Task>(&task_text)?;
                Ok((
                    Operation::SetTaskCompleted {
                        id: task.id.clone(),
                        completed: true,
                    },
                    task.text.clone(),
                ))
            }
            ValidatedCall::ManageTask(ManageTaskArgs {
                action: TaskAction::Delete,
                task_text,
                ..
            }) => {
                let task = self.pick::<Task>(&task_text)?;
                Ok((Operation::DeleteTask { id: task.id.clone() }, task.text.clone()))
            }
            ValidatedCall::UpdateHabit(args) => {
                let habit = self.pick::<Habit>(&args.habit_name)?;
                Ok((
                    Operation::LogHabit {
                        id: habit.id.clone(),
                        completed: args.completed,
                    },
                    habit.name.clone(),
                ))
            }
            ValidatedCall::UpdateProject(args) => {
                let project = self.pick::<Project>(&args.project_name)?;
                Ok((
                    Operation::UpdateProject {
                        id: project.id.clone(),
                        change: ProjectChange {
                            content: args.update_content,
                            status: args.status,
                            next_step: args.next_step,
                        },
                    },
                    project.name.clone(),
                ))
            }
            ValidatedCall::RememberFact(args) => Ok((Operation::RememberFact(args.fact.clone()), args.fact)),
        }
    }

    async fn run(&self, op: Operation, label: &str) -> Result<Committed, CallFailure> {
        match self.reconciler.reconcile(op).await {
            Reconciled::Committed { key, mutation, .. } => Ok(Committed {
                summary: describe(&mutation, label),
                key,
            }),
            Reconciled::RolledBack { error, .. } => Err(CallFailure::AuthorityFailure(error)),
            Reconciled::Skipped { reason, .. } => Err(CallFailure::Skipped(reason)),
        }
    }

    fn label_of<T: Entity>(&self, id: &str) -> String {
        self.store()
            .find::<T>(id)
            .map(|e| e.label().to_string())
            .unwrap_or_else(|| T::key_for(id).to_string())
    }

    // Direct UI operations: exact identity, no resolution or validation

    /// Flip a task's completion
    pub async fn toggle_task(&self, id: &str) -> Result<Committed, CallFailure> {
        debug!(%id, "toggle_task: called");
        let label = self.label_of::<Task>(id);
        self.run(Operation::ToggleTask { id: id.to_string() }, &label).await
    }

    /// Mark a habit done (or not done) for today
    pub async fn log_habit(&self, id: &str, completed: bool) -> Result<Committed, CallFailure> {
        debug!(%id, completed, "log_habit: called");
        self.store().roll_over(mutation::local_today(Utc::now()));
        let label = self.label_of::<Habit>(id);
        self.run(
            Operation::LogHabit {
                id: id.to_string(),
                completed,
            },
            &label,
        )
        .await
    }

    pub async fn create_project(
        &self,
        name: &str,
        role: Role,
        status: ProjectStatus,
    ) -> Result<Committed, CallFailure> {
        debug!(%name, %role, %status, "create_project: called");
        let project = mutation::new_project(name, role, status, Utc::now());
        self.run(Operation::InsertProject(project), name).await
    }

    pub async fn create_habit(&self, name: &str, category: &str) -> Result<Committed, CallFailure> {
        debug!(%name, %category, "create_habit: called");
        let habit = mutation::new_habit(name, category, Utc::now());
        self.run(Operation::InsertHabit(habit), name).await
    }

    /// Add a task directly (optionally under a project by exact ID)
    pub async fn add_task(&self, text: &str, role: Role, project_id: Option<String>) -> Result<Committed, CallFailure> {
        debug!(%text, %role, ?project_id, "add_task: called");
        let task = mutation::add_task(text, role, project_id, Utc::now());
        self.run(Operation::InsertTask(task), text).await
    }
}
