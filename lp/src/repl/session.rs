use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::broadcast;
use tracing::debug;

use crate::assistant::{ChatSession, TurnResult};
use crate::llm::Role;
use crate::render;
use crate::store::StoreEvent;

const HISTORY_PREVIEW_CHARS: usize = 50;

/// A line starting with `/`, handled locally instead of sent to the assistant
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slash {
    Help,
    Quit,
    Clear,
    History,
    State,
    Facts,
    Unknown(String),
}

impl Slash {
    fn parse(line: &str) -> Option<Self> {
        let word = line.strip_prefix('/')?.split_whitespace().next().unwrap_or("");
        Some(match word {
            "help" | "h" | "?" => Slash::Help,
            "quit" | "q" | "exit" => Slash::Quit,
            "clear" | "c" => Slash::Clear,
            "history" => Slash::History,
            "state" | "s" => Slash::State,
            "facts" | "f" => Slash::Facts,
            other => Slash::Unknown(other.to_string()),
        })
    }
}

/// Readline front end over a [`ChatSession`]
pub struct ReplSession {
    chat: ChatSession,
    events: broadcast::Receiver<StoreEvent>,
}

impl ReplSession {
    pub fn new(chat: ChatSession) -> Self {
        let events = chat.controller().store().subscribe();
        Self { chat, events }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.greet();
        let mut editor = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        let prompt = format!("{} ", ">".bright_green());

        loop {
            let line = match editor.readline(&prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(eyre::eyre!("Readline error: {}", e)),
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let _ = editor.add_history_entry(line);

            match Slash::parse(line) {
                Some(Slash::Quit) => break,
                Some(slash) => self.run_slash(slash),
                None => self.take_turn(line).await,
            }
        }

        println!("See you tomorrow.");
        Ok(())
    }

    fn greet(&self) {
        println!();
        println!("{}", "LifePilot".bright_cyan().bold());
        println!("Tell me what you did, what's next, or what to remember.");
        println!("{} lists commands, {} leaves", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn run_slash(&mut self, slash: Slash) {
        debug!(?slash, "run_slash: called");
        match slash {
            Slash::Help => print_help(),
            Slash::Clear => {
                self.chat.clear();
                println!("{}", "Starting a fresh conversation; your data is untouched.".dimmed());
            }
            Slash::History => self.print_history(),
            Slash::State => print!("{}", render::state_text(&self.chat.controller().store().get())),
            Slash::Facts => print!("{}", render::facts_text(&self.chat.controller().store().get())),
            Slash::Unknown(word) => println!("{} No command /{}; try {}", "?".yellow(), word, "/help".yellow()),
            Slash::Quit => {}
        }
    }

    fn print_history(&self) {
        let history = self.chat.history();
        if history.is_empty() {
            println!("{}", "Nothing said yet.".dimmed());
            return;
        }
        for (n, msg) in history.iter().enumerate() {
            let speaker = match msg.role {
                Role::User => "You".bright_green(),
                Role::Assistant => "LifePilot".bright_blue(),
            };
            println!("  {:>2} {}: {}", n + 1, speaker, msg.preview(HISTORY_PREVIEW_CHARS));
        }
    }

    async fn take_turn(&mut self, utterance: &str) {
        let result = self.chat.send(utterance).await;
        let changes = self.drain_events();
        debug!(changes, "take_turn: store events drained");
        print_turn(&result);
    }

    /// Count entity changes published since the last turn
    fn drain_events(&mut self) -> usize {
        let mut changes = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) if event.key().is_some() => changes += 1,
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(n)) => changes += n as usize,
                Err(_) => return changes,
            }
        }
    }
}

fn print_help() {
    let rows = [
        ("/help", "Show this list"),
        ("/quit", "Leave"),
        ("/clear", "Forget the conversation so far"),
        ("/history", "Show the conversation so far"),
        ("/state", "Show projects, tasks and habits"),
        ("/facts", "Show what I remember about you"),
    ];
    println!();
    for (cmd, what) in rows {
        println!("  {:10} {}", cmd.yellow(), what);
    }
    println!();
}

/// Print a turn's reply followed by what actually changed
pub fn print_turn(result: &TurnResult) {
    println!();
    if result.aborted.is_some() {
        println!("{}", result.reply_text.red());
        println!();
        return;
    }

    println!("{}", result.reply_text);
    for committed in result.committed() {
        println!("  {} {}", "✓".green(), committed.summary.dimmed());
    }
    println!();
}
