//! CLI entrypoint for bookwright
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bookwright_application::ports::credit_gate::{CreditError, CreditGate, UnmeteredCredits};
use bookwright_application::ports::turn_logger::{NoTurnLog, TurnLogger};
use bookwright_application::{
    ApprovalGateUseCase, ResumeUseCase, RunTurnUseCase, StatusUseCase,
};
use bookwright_domain::{InstructionSynthesizer, ProjectId};
use bookwright_infrastructure::{
    ConfigLoader, FileConfig, HttpAgentRuntime, JsonFileStore, JsonlTurnLogger, LocalCreditLedger,
};
use clap::Parser;
use commands::{Cli, Command};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Credit gate chosen by configuration.
enum ConfiguredGate {
    Ledger(LocalCreditLedger),
    Unmetered(UnmeteredCredits),
}

#[async_trait]
impl CreditGate for ConfiguredGate {
    async fn reserve(&self, project: &ProjectId, estimate: u64) -> Result<(), CreditError> {
        match self {
            ConfiguredGate::Ledger(ledger) => ledger.reserve(project, estimate).await,
            ConfiguredGate::Unmetered(gate) => gate.reserve(project, estimate).await,
        }
    }

    async fn commit(&self, project: &ProjectId, used: u64) -> Result<(), CreditError> {
        match self {
            ConfiguredGate::Ledger(ledger) => ledger.commit(project, used).await,
            ConfiguredGate::Unmetered(gate) => gate.commit(project, used).await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e.to_string()))?
    };

    // === Dependency Injection ===
    let store = Arc::new(JsonFileStore::new(config.storage.resolved_root()));
    info!(root = %store.root().display(), "using project store");

    match cli.command {
        Command::New(args) => commands::new_project(&store, args).await,
        Command::List => commands::list_projects(&StatusUseCase::new(store)).await,
        Command::Status(args) => commands::status(&StatusUseCase::new(store), args).await,
        Command::Run(args) => {
            let use_case = build_run_turn(&config, store)?;
            commands::run(&use_case, args).await
        }
        Command::Approve(args) => {
            commands::approve(&ApprovalGateUseCase::new(store), args).await
        }
        Command::Reject(args) => {
            commands::reject(&ApprovalGateUseCase::new(store), args).await
        }
        Command::AcceptChapter(args) => {
            commands::accept_chapter(&ApprovalGateUseCase::new(store), args).await
        }
        Command::ReviseChapter(args) => {
            commands::revise_chapter(&ApprovalGateUseCase::new(store), args).await
        }
        Command::Pause(args) => commands::pause(&ResumeUseCase::new(store), args).await,
        Command::Resume(args) => {
            let run_turn = build_run_turn(&config, store.clone())?;
            commands::resume(&ResumeUseCase::new(store), &run_turn, args).await
        }
    }
}

fn build_run_turn(
    config: &FileConfig,
    store: Arc<JsonFileStore>,
) -> Result<RunTurnUseCase<JsonFileStore, HttpAgentRuntime, ConfiguredGate>> {
    let mut runtime = HttpAgentRuntime::new(
        &config.runtime.base_url,
        Duration::from_secs(config.runtime.request_timeout_secs),
    )
    .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    if let Some(env_name) = &config.runtime.api_key_env {
        let key = std::env::var(env_name)
            .with_context(|| format!("API key variable {} is not set", env_name))?;
        runtime = runtime.with_api_key(key);
    }

    let gate = if config.credits.enabled {
        ConfiguredGate::Ledger(LocalCreditLedger::new(config.credits.balance))
    } else {
        ConfiguredGate::Unmetered(UnmeteredCredits)
    };

    let logger: Arc<dyn TurnLogger> = match &config.logging.turn_log {
        Some(path) => match JsonlTurnLogger::new(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoTurnLog),
        },
        None => Arc::new(NoTurnLog),
    };

    let mut use_case = RunTurnUseCase::new(store, Arc::new(runtime), Arc::new(gate))
        .with_synthesizer(InstructionSynthesizer::new(config.approval.parsed_policy()))
        .with_logger(logger);

    if config.runtime.turn_timeout_secs > 0 {
        use_case = use_case.with_timeout(Duration::from_secs(config.runtime.turn_timeout_secs));
    }

    Ok(use_case)
}
