//! `camloc` – command line front end for the camloc angulation stack.
//!
//! Subcommands:
//!
//! - `run`      – connect to the MQTT broker and locate the target live.
//! - `send`     – publish one command (flash, state, pose, …) to the sensors.
//! - `replay`   – feed a captured wire stream through the locator service and
//!   print every outbound message.
//! - `estimate` – one-shot position fix from a static sensor file.
//! - `check`    – run the installation-geometry check over every sensor pair.
//! - `init`     – write `~/.camloc/config.toml` with default values.

mod capture;
mod cli;
mod commands;
mod config;
mod sensors;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::info;

use cli::{Cli, Commands, LogFormat};
use commands::{run_check, run_estimate, run_init, run_live, run_replay, run_send};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG wins over -v; user-facing output still goes through println!.
    init_logging(&cli);
    info!(version = env!("CARGO_PKG_VERSION"), "camloc starting");

    let config_path = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Run(args) => match config::load(config_path) {
            Ok(cfg) => run_live(args, &cfg).await,
            Err(e) => Err(e),
        },
        Commands::Send(args) => run_send(args).await,
        Commands::Replay(args) => match config::load(config_path) {
            Ok(cfg) => run_replay(args, &cfg).await,
            Err(e) => Err(e),
        },
        Commands::Estimate(args) => config::load(config_path).and_then(|cfg| run_estimate(args, &cfg)),
        Commands::Check(args) => run_check(args),
        Commands::Init { force } => run_init(config_path, *force),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            println!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    use tracing_subscriber::EnvFilter;

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match cli.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init(),
    }
}
