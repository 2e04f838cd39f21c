//! Per-call outcomes and reply synthesis

use thiserror::Error;

use crate::domain::{EntityKey, EntityKind, EntityValue};
use crate::mutation::{Mutation, SkipReason};
use crate::reconcile::AuthorityError;
use crate::tools::ToolError;

/// Spoken when the intent resolver cannot be reached
pub const RESOLVER_UNAVAILABLE_REPLY: &str =
    "I lost my connection to the assistant service, so I didn't change anything. Please try again.";

/// Why one tool call did not commit
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CallFailure {
    #[error("\"{query}\" matches more than one {kind}: {}", .candidates.join(", "))]
    ResolutionAmbiguous {
        kind: EntityKind,
        query: String,
        candidates: Vec<String>,
    },

    #[error("no {kind} matches \"{query}\"")]
    ResolutionNotFound { kind: EntityKind, query: String },

    #[error("the request was invalid ({0})")]
    ValidationRejected(#[from] ToolError),

    #[error("the change could not be saved ({0})")]
    AuthorityFailure(#[from] AuthorityError),

    #[error("nothing to change ({0})")]
    Skipped(#[from] SkipReason),
}

/// Why a whole turn ended early
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("intent resolver unavailable: {0}")]
    ResolverUnavailable(String),
}

/// A change that stuck
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    pub key: EntityKey,
    /// Short human description, e.g. `logged "Gym" (streak 4)`
    pub summary: String,
}

/// What happened to one tool call
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub call_id: String,
    pub tool: String,
    pub result: Result<Committed, CallFailure>,
}

impl CallOutcome {
    pub fn is_committed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result of one conversational turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    pub reply_text: String,
    /// One per tool call, in execution order
    pub outcomes: Vec<CallOutcome>,
    pub aborted: Option<TurnError>,
}

impl TurnResult {
    pub fn aborted(error: TurnError) -> Self {
        Self {
            reply_text: RESOLVER_UNAVAILABLE_REPLY.to_string(),
            outcomes: Vec::new(),
            aborted: Some(error),
        }
    }

    pub fn committed(&self) -> impl Iterator<Item = &Committed> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }
}

/// Describe a committed write; `label` names the target when the write no
/// longer carries it (removals)
pub fn describe(mutation: &Mutation, label: &str) -> String {
    match mutation {
        Mutation::Insert(EntityValue::Task(t)) => format!("added task \"{}\"", t.text),
        Mutation::Insert(EntityValue::Project(p)) => format!("created project \"{}\"", p.name),
        Mutation::Insert(EntityValue::Habit(h)) => format!("created habit \"{}\"", h.name),
        Mutation::Replace(EntityValue::Task(t)) if t.completed => format!("marked \"{}\" done", t.text),
        Mutation::Replace(EntityValue::Task(t)) => format!("reopened \"{}\"", t.text),
        Mutation::Replace(EntityValue::Habit(h)) if h.completed_today => {
            format!("logged \"{}\" (streak {})", h.name, h.streak)
        }
        Mutation::Replace(EntityValue::Habit(h)) => format!("unmarked \"{}\" for today", h.name),
        Mutation::Replace(EntityValue::Project(p)) => format!("updated \"{}\" ({})", p.name, p.status),
        Mutation::Remove(_) => format!("deleted \"{}\"", label),
        Mutation::ReplaceFacts(facts) => match facts.last() {
            Some(fact) => format!("noted \"{}\"", fact),
            None => "updated facts".to_string(),
        },
    }
}

/// Build the reply shown to the user
///
/// The resolver writes its text before any call runs, so it only leads when
/// every proposed call committed. Otherwise the lead lists what did commit,
/// and every call that did not gets a caveat line.
pub fn synthesize(reply_text: &str, outcomes: &[CallOutcome]) -> String {
    let reply = reply_text.trim();
    let all_committed = outcomes.iter().all(CallOutcome::is_committed);
    let done: Vec<&str> = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .map(|c| c.summary.as_str())
        .collect();

    let mut text = if all_committed && !reply.is_empty() {
        reply.to_string()
    } else if !done.is_empty() {
        format!("Done: {}.", done.join("; "))
    } else if outcomes.is_empty() {
        "I didn't change anything.".to_string()
    } else {
        "I couldn't apply that change.".to_string()
    };

    let mut failed = failures(outcomes).peekable();
    if failed.peek().is_some() {
        text.push_str("\n\nHeads up, not everything went through:");
        for (outcome, failure) in failed {
            text.push_str(&format!("\n- {}: {}", outcome.tool, failure));
        }
    }

    text
}

fn failures(outcomes: &[CallOutcome]) -> impl Iterator<Item = (&CallOutcome, &CallFailure)> {
    outcomes.iter().filter_map(|o| o.result.as_ref().err().map(|e| (o, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(tool: &str, summary: &str) -> CallOutcome {
        CallOutcome {
            call_id: "c1".to_string(),
            tool: tool.to_string(),
            result: Ok(Committed {
                key: EntityKey::Facts,
                summary: summary.to_string(),
            }),
        }
    }

    fn failed(tool: &str, failure: CallFailure) -> CallOutcome {
        CallOutcome {
            call_id: "c2".to_string(),
            tool: tool.to_string(),
            result: Err(failure),
        }
    }

    #[test]
    fn test_reply_text_leads() {
        let text = synthesize("Great job!", &[ok("updateHabit", "logged \"Gym\" (streak 2)")]);
        assert_eq!(text, "Great job!");
    }

    #[test]
    fn test_empty_reply_summarizes_commits() {
        let text = synthesize("  ", &[ok("rememberFact", "noted \"x\""), ok("manageTask", "added task \"y\"")]);
        assert_eq!(text, "Done: noted \"x\"; added task \"y\".");

        assert_eq!(synthesize("", &[]), "I didn't change anything.");
    }

    #[test]
    fn test_failures_get_a_caveat() {
        let outcomes = vec![
            ok("updateHabit", "logged"),
            failed(
                "updateProject",
                CallFailure::ResolutionAmbiguous {
                    kind: EntityKind::Project,
                    query: "excuse".to_string(),
                    candidates: vec!["No Excuse".to_string(), "No Excuse 2.0".to_string()],
                },
            ),
        ];
        let text = synthesize("Updated both!", &outcomes);
        assert!(text.starts_with("Done: logged."));
        assert!(!text.contains("Updated both!"));
        assert!(text.contains("- updateProject: \"excuse\" matches more than one project: No Excuse, No Excuse 2.0"));
    }

    #[test]
    fn test_nothing_committed_never_echoes_the_resolver() {
        let outcomes = vec![failed(
            "updateHabit",
            CallFailure::AuthorityFailure(AuthorityError::Rejected("offline".to_string())),
        )];
        let text = synthesize("Nice work, streak extended to 6!", &outcomes);
        assert!(text.starts_with("I couldn't apply that change."));
        assert!(!text.contains("streak extended"));
        assert!(text.contains("- updateHabit: the change could not be saved"));
    }

    #[test]
    fn test_chat_without_calls_keeps_reply() {
        assert_eq!(synthesize("Good morning!", &[]), "Good morning!");
    }

    #[test]
    fn test_aborted_turn_uses_fixed_reply() {
        let result = TurnResult::aborted(TurnError::ResolverUnavailable("timeout".to_string()));
        assert_eq!(result.reply_text, RESOLVER_UNAVAILABLE_REPLY);
        assert!(result.outcomes.is_empty());
    }
}
