//! Conversation history for a run of turns

use std::sync::Arc;

use tracing::debug;

use super::controller::TurnController;
use super::outcome::TurnResult;
use crate::llm::{Message, Role};

/// A conversation with a bounded history window
///
/// Only turns that reached the resolver are remembered. The window always
/// starts with a user message.
pub struct ChatSession {
    controller: Arc<TurnController>,
    history: Vec<Message>,
    limit: usize,
}

impl ChatSession {
    pub fn new(controller: Arc<TurnController>, limit: usize) -> Self {
        debug!(limit, "ChatSession::new: called");
        Self {
            controller,
            history: Vec::new(),
            limit: limit.max(2),
        }
    }

    pub fn controller(&self) -> &TurnController {
        &self.controller
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Run one turn and remember it
    pub async fn send(&mut self, utterance: &str) -> TurnResult {
        debug!(history = self.history.len(), "ChatSession::send: called");
        let result = self.controller.handle_turn(&self.history, utterance).await;

        if result.aborted.is_none() {
            self.history.push(Message::user(utterance));
            self.history.push(Message::assistant(result.reply_text.clone()));
            self.trim();
        }
        result
    }

    fn trim(&mut self) {
        if self.history.len() > self.limit {
            let excess = self.history.len() - self.limit;
            self.history.drain(..excess);
        }
        while self.history.first().is_some_and(|m| m.role != Role::User) {
            self.history.remove(0);
        }
    }
}
