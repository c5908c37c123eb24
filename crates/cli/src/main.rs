//! Proof orchestration from the command line.
//!
//! Run with: `dfprove [--config dfprove.toml] <command>`

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{CacheCommand, Params, Prove};
use df_runtime::OrchestratorConfig;

/// Generate, cache and inspect game action proofs
#[derive(Parser)]
#[command(name = "dfprove")]
#[command(about = "Proof orchestration for game actions", long_about = None)]
#[command(version)]
struct Cli {
    /// Orchestrator configuration file
    #[arg(short, long, global = true, default_value = "dfprove.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Prove an action and print its call arguments as JSON
    Prove(Prove),

    /// Inspect or evict cached proofs
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Print the world parameters the circuits are proven against
    Params(Params),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for DFPROVE_* overrides)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = OrchestratorConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;

    match cli.command {
        Command::Prove(cmd) => cmd.execute(&config),
        Command::Cache(cmd) => cmd.execute(&config),
        Command::Params(cmd) => cmd.execute(&config),
    }
}
