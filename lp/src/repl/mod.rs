//! Interactive REPL for LifePilot
//!
//! A readline loop over a `ChatSession`, with slash commands for history and
//! state.

mod session;

pub use session::{ReplSession, print_turn};

use std::sync::Arc;

use eyre::Result;

use crate::assistant::{ChatSession, TurnController};
use crate::config::Config;

pub async fn run_interactive(config: &Config, controller: Arc<TurnController>) -> Result<()> {
    let chat = ChatSession::new(controller, config.assistant.history_limit);
    let mut session = ReplSession::new(chat);
    session.run().await
}
