//! Turn handling: one utterance in, committed changes and a reply out

mod controller;
mod outcome;
mod session;

pub use controller::{TurnController, TurnPhase};
pub use outcome::{
    CallFailure, CallOutcome, Committed, RESOLVER_UNAVAILABLE_REPLY, TurnError, TurnResult, describe, synthesize,
};
pub use session::ChatSession;
