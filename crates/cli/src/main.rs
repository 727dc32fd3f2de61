use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use claimtree_service::config::{Config, LoggingConfig};
use std::path::PathBuf;
use tracing::debug;

mod cmd;

#[derive(Debug, Parser)]
#[command(name = "claimtree")]
#[command(version, about = "Claim tree operator CLI")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encode a claim and print its index and total hashes.
    Encode(cmd::claim::EncodeArgs),
    /// Decode a hex claim and print its fields.
    Inspect(cmd::claim::InspectArgs),
    /// Add a hex claim to the identity tree.
    Add(cmd::tree::AddArgs),
    /// Generate a proof for an index hash.
    Prove(cmd::tree::ProveArgs),
    /// Print the identity tree root.
    Root,
    /// Check a proof against a root.
    Verify(cmd::verify::VerifyArgs),
    /// Publish and prove roots through the relay tree.
    #[command(subcommand)]
    Relay(cmd::relay::RelayCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    init_logging(cli.debug, &config.logging)?;
    debug!(config = ?cli.config, "Configuration loaded");

    match cli.command {
        Command::Encode(args) => cmd::claim::run_encode(args, &config)?,
        Command::Inspect(args) => cmd::claim::run_inspect(args)?,
        Command::Add(args) => cmd::tree::run_add(args, &config)?,
        Command::Prove(args) => cmd::tree::run_prove(args, &config)?,
        Command::Root => cmd::tree::run_root(&config)?,
        Command::Verify(args) => cmd::verify::run(args, &config)?,
        Command::Relay(command) => cmd::relay::run(command, &config)?,
    }

    Ok(())
}

/// Initialize tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries command output.
fn init_logging(debug: bool, logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = if debug {
        EnvFilter::new("claimtree_cli=debug,claimtree_service=debug,claimtree_smt=debug")
    } else {
        let level = &logging.level;
        EnvFilter::try_from_default_env().or_else(|_| {
            EnvFilter::try_new(format!(
                "claimtree_cli={level},claimtree_service={level},claimtree_smt={level}"
            ))
        })?
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.context("Failed to initialize logging")?;

    Ok(())
}
