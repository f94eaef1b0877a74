//! Command line interface for Arena
//!
//! Drives the session registry in-process: runs scripted scenarios, stages
//! concurrent join stampedes against a single session, and checks
//! configuration files.

use anyhow::{bail, Result};
use arena_core::{ArenaConfig, ArenaError, PlayerId};
use arena_effects::MemorySessionStore;
use arena_registry::{SessionRegistry, SessionService};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod scenario;

use scenario::Scenario;

#[derive(Parser)]
#[command(name = "arena")]
#[command(about = "Arena - Game Session Registry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file against an in-memory registry
    Scenario {
        /// Scenario TOML file
        file: PathBuf,

        /// Print every outcome as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Send many concurrent joins at one session
    Stampede {
        /// Session capacity
        #[arg(short = 'n', long, default_value = "4")]
        capacity: u32,

        /// Number of concurrent joiners
        #[arg(short = 'm', long, default_value = "32")]
        players: u32,
    },

    /// Validate and print the effective configuration
    CheckConfig,
}

#[derive(Serialize)]
struct StampedeReport {
    capacity: u32,
    attempted: u32,
    admitted: usize,
    session_full: usize,
    other_errors: usize,
    final_players: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scenario { file, json } => run_scenario(&config, file, json).await?,
        Commands::Stampede { capacity, players } => stampede(&config, capacity, players).await?,
        Commands::CheckConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn registry(config: &ArenaConfig) -> Result<Arc<SessionRegistry<MemorySessionStore>>> {
    let registry = SessionRegistry::new(MemorySessionStore::new(), config.registry.clone())?;
    Ok(Arc::new(registry))
}

async fn run_scenario(config: &ArenaConfig, file: PathBuf, json: bool) -> Result<()> {
    let scenario = Scenario::load(&file)?;
    let service = SessionService::new(registry(config)?);

    tracing::info!(file = %file.display(), steps = scenario.steps.len(), "running scenario");
    let report = scenario.run(&service).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for outcome in &report.outcomes {
            let mark = if outcome.as_expected { "ok  " } else { "FAIL" };
            println!(
                "{mark} {:>3} {:<6} {:<10} {}",
                outcome.step, outcome.op, outcome.actor, outcome.message
            );
        }
    }

    if !report.passed() {
        for failure in &report.failures {
            eprintln!("{failure}");
        }
        bail!("{} expectation(s) not met", report.failures.len());
    }
    Ok(())
}

async fn stampede(config: &ArenaConfig, capacity: u32, players: u32) -> Result<()> {
    let registry = registry(config)?;
    let id = registry.create("stampede", capacity, None).await?.id;

    let joins = (0..players).map(|_| {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.join(id, PlayerId::new()).await })
    });
    let results = join_all(joins).await;

    let mut report = StampedeReport {
        capacity,
        attempted: players,
        admitted: 0,
        session_full: 0,
        other_errors: 0,
        final_players: 0,
    };
    for result in results {
        match result? {
            Ok(_) => report.admitted += 1,
            Err(ArenaError::SessionFull { .. }) => report.session_full += 1,
            Err(err) => {
                tracing::warn!(error = %err, "join failed");
                report.other_errors += 1;
            }
        }
    }
    report.final_players = registry.get(id).await?.player_count();

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.final_players > capacity as usize {
        bail!("capacity exceeded: {} > {capacity}", report.final_players);
    }
    Ok(())
}
