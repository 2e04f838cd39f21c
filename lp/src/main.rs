//! LifePilot - Conversational Productivity Assistant
//!
//! CLI entry point: chat with the assistant or edit state directly.

use std::fs;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use lifepilot::assistant::{CallFailure, ChatSession, Committed, TurnController};
use lifepilot::cli::{self, Cli, Command, FactCommand, HabitCommand, OutputFormat, ProjectCommand, TaskCommand};
use lifepilot::config::Config;
use lifepilot::domain::{Entity, Habit, Project, Task, resolve_id_prefix};
use lifepilot::intent::{IntentResolver, LlmIntentResolver, OfflineResolver};
use lifepilot::llm::create_client;
use lifepilot::persistence::{JsonFileRepository, PersistenceAuthority, StateRepository};
use lifepilot::reconcile::Reconciler;
use lifepilot::store::DomainStore;
use lifepilot::{mutation, render, repl};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = cli::log_dir();

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("lifepilot.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Everything a command needs, wired from config
struct App {
    repository: Arc<JsonFileRepository>,
    controller: Arc<TurnController>,
}

impl App {
    async fn open(config: &Config, resolver: Arc<dyn IntentResolver>) -> Result<Self> {
        let path = config.storage.state_path();
        debug!(?path, "App::open: called");
        let repository = Arc::new(JsonFileRepository::new(path));
        let state = repository.load().await.context("Failed to load state")?;

        let store = DomainStore::new(state);
        let rolled = store.roll_over(mutation::local_today(chrono::Utc::now()));
        if rolled > 0 {
            info!(rolled, "Cleared yesterday's habit checkmarks");
        }

        let authority = PersistenceAuthority::new(repository.clone(), store.clone(), config.storage.save_timeout());
        let reconciler = Reconciler::new(store, Arc::new(authority));
        let controller = TurnController::new(reconciler, resolver, config.assistant.ambiguity);

        Ok(Self {
            repository,
            controller: Arc::new(controller),
        })
    }

    /// Open with the assistant service; fails fast on missing credentials
    async fn open_online(config: &Config) -> Result<Self> {
        config.validate()?;
        let client = create_client(&config.llm).map_err(|e| eyre::eyre!("Failed to create LLM client: {}", e))?;
        let resolver = Arc::new(LlmIntentResolver::new(client, config.assistant.max_tokens));
        Self::open(config, resolver).await
    }

    /// Open for direct commands that never consult the assistant
    async fn open_offline(config: &Config) -> Result<Self> {
        Self::open(config, Arc::new(OfflineResolver::new("direct command"))).await
    }

    fn store(&self) -> &DomainStore {
        self.controller.store()
    }

    /// Write whatever is in memory; run on the way out
    async fn flush(&self) -> Result<()> {
        self.repository
            .save(&self.store().get())
            .await
            .context("Failed to save state")
    }

    /// Expand an ID prefix against the current state
    fn resolve_id<T: Entity>(&self, reference: &str) -> Result<String> {
        let state = self.store().get();
        let ids = T::collection(&state).iter().map(|e| e.id());
        match resolve_id_prefix(ids, reference) {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(eyre::eyre!("No {} matches '{}'", T::KIND, reference)),
            Err(candidates) => Err(eyre::eyre!(
                "'{}' matches several {}s: {}",
                reference,
                T::KIND,
                candidates.join(", ")
            )),
        }
    }
}

fn report(result: Result<Committed, CallFailure>) -> Result<()> {
    match result {
        Ok(committed) => {
            println!("{} {}", "✓".green(), committed.summary);
            Ok(())
        }
        Err(failure) => Err(eyre::eyre!("{}", failure)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        "LifePilot loaded config: provider={}, model={}, state={}",
        config.llm.provider, config.llm.model, config.storage.state_file
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Chat { message }) => cmd_chat(&config, &message.join(" ")).await,
        Some(Command::Repl) => cmd_repl(&config).await,
        Some(Command::Show { format }) => cmd_show(&config, format).await,
        Some(Command::Task { command }) => cmd_task(&config, command).await,
        Some(Command::Habit { command }) => cmd_habit(&config, command).await,
        Some(Command::Project { command }) => cmd_project(&config, command).await,
        Some(Command::Fact { command }) => cmd_fact(&config, command).await,
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// One turn, then exit
async fn cmd_chat(config: &Config, message: &str) -> Result<()> {
    let app = App::open_online(config).await?;
    let mut chat = ChatSession::new(app.controller.clone(), config.assistant.history_limit);

    let result = chat.send(message).await;
    repl::print_turn(&result);
    app.flush().await?;

    if let Some(error) = result.aborted {
        warn!(%error, "Turn aborted");
        return Err(eyre::eyre!("{}", error));
    }
    Ok(())
}

async fn cmd_repl(config: &Config) -> Result<()> {
    let app = App::open_online(config).await?;
    let outcome = repl::run_interactive(config, app.controller.clone()).await;
    app.flush().await?;
    outcome
}

async fn cmd_show(config: &Config, format: OutputFormat) -> Result<()> {
    let app = App::open_offline(config).await?;
    let state = app.store().get();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Text => print!("{}", render::state_text(&state)),
    }
    Ok(())
}

async fn cmd_task(config: &Config, command: TaskCommand) -> Result<()> {
    let app = App::open_offline(config).await?;
    match command {
        TaskCommand::Add { text, role, project } => {
            let project_id = project.map(|p| app.resolve_id::<Project>(&p)).transpose()?;
            report(app.controller.add_task(&text, role, project_id).await)
        }
        TaskCommand::Toggle { id } => {
            let id = app.resolve_id::<Task>(&id)?;
            report(app.controller.toggle_task(&id).await)
        }
    }
}

async fn cmd_habit(config: &Config, command: HabitCommand) -> Result<()> {
    let app = App::open_offline(config).await?;
    match command {
        HabitCommand::Add { name, category } => report(app.controller.create_habit(&name, &category).await),
        HabitCommand::Log { id, undo } => {
            let id = app.resolve_id::<Habit>(&id)?;
            report(app.controller.log_habit(&id, !undo).await)
        }
    }
}

async fn cmd_project(config: &Config, command: ProjectCommand) -> Result<()> {
    let app = App::open_offline(config).await?;
    match command {
        ProjectCommand::Add { name, role, status } => report(app.controller.create_project(&name, role, status).await),
    }
}

async fn cmd_fact(config: &Config, command: FactCommand) -> Result<()> {
    let app = App::open_offline(config).await?;
    match command {
        FactCommand::List => {
            print!("{}", render::facts_text(&app.store().get()));
            Ok(())
        }
    }
}
