//! Command-line surface of `lp`

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::{ProjectStatus, Role};

/// LifePilot - conversational productivity assistant
#[derive(Parser)]
#[command(
    name = "lp",
    about = "Talk to your projects, tasks and habits",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/lifepilot/logs/lifepilot.log"
)]
pub struct Cli {
    /// Config file to use instead of the usual search
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// TRACE, DEBUG, INFO, WARN or ERROR
    #[arg(short = 'l', long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Say one thing to the assistant and print its reply
    Chat {
        /// What to tell the assistant
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Start an interactive conversation
    Repl,

    /// Print the current state
    Show {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Work with tasks directly
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Work with habits directly
    Habit {
        #[command(subcommand)]
        command: HabitCommand,
    },

    /// Work with projects directly
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Work with remembered facts
    Fact {
        #[command(subcommand)]
        command: FactCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Add a task
    Add {
        /// Task text
        text: String,

        /// Role (COO, Founder, PM, Personal)
        #[arg(short, long, default_value = "Personal")]
        role: Role,

        /// Project ID (or unique prefix)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Flip a task between done and not done
    Toggle {
        /// Task ID (or unique prefix)
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum HabitCommand {
    /// Create a habit
    Add {
        /// Habit name
        name: String,

        /// Category, e.g. health or content
        #[arg(short = 'C', long, default_value = "general")]
        category: String,
    },

    /// Mark a habit done for today
    Log {
        /// Habit ID (or unique prefix)
        id: String,

        /// Unmark instead
        #[arg(long)]
        undo: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Create a project
    Add {
        /// Project name
        name: String,

        /// Role (COO, Founder, PM, Personal)
        #[arg(short, long, default_value = "Personal")]
        role: Role,

        /// Status (on_track, at_risk, delayed, completed, maintenance)
        #[arg(short, long, default_value = "on_track")]
        status: ProjectStatus,
    },
}

#[derive(Debug, Subcommand)]
pub enum FactCommand {
    /// List remembered facts
    List,
}

/// How `show` prints state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Grouped, colored listing
    #[default]
    Text,
    /// The state file shape, pretty-printed
    Json,
}

/// Directory the log file is written to
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lifepilot")
        .join("logs")
}
