// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! pgconf-propagator - apply a PostgreSQL property file to a Patroni member.
//!
//! Usage:
//!   pgconf-propagator propagate <SETTINGS_FILE>
//!   pgconf-propagator validate --conf-file <FILE> [--restart-pg true]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use pgconf_propagator::config::Config;
use pgconf_propagator::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "pgconf-propagator", about = "Reconcile PostgreSQL settings on a Patroni member")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit changed settings to the cluster and restart the member if required
    Propagate {
        /// Property file with key=value settings
        settings_file: PathBuf,
    },
    /// Compare settings with the running engine without submitting them
    Validate {
        /// Property file with key=value settings
        #[arg(long = "conf-file")]
        conf_file: PathBuf,
        /// Restart the member if differing settings require it
        #[arg(long = "restart-pg", default_value = "false", action = clap::ArgAction::Set)]
        restart_pg: bool,
    },
}

fn init_tracing() {
    let default_level = match std::env::var("LOG_LEVEL").as_deref() {
        Ok("debug") => "debug",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pgconf_propagator={}", default_level).into()),
        )
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load .env file if present
    let dotenv = dotenvy::dotenv();

    init_tracing();

    if let Err(e) = dotenv {
        warn!("No .env file loaded: {}", e);
    }

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = Config::from_env()?;

    info!(
        cluster = config.cluster_name.as_deref(),
        member = %config.member_name,
        poll_iterations = config.restart_poll.iterations,
        poll_interval_secs = config.restart_poll.interval.as_secs(),
        "Starting pgconf-propagator"
    );

    let pipeline = Pipeline::from_config(&config)?;

    let outcome = match cli.command {
        Command::Propagate { settings_file } => pipeline.propagate_file(&settings_file).await?,
        Command::Validate {
            conf_file,
            restart_pg,
        } => pipeline.validate_file(&conf_file, restart_pg).await?,
    };

    info!(outcome = ?outcome, exit_code = outcome.exit_code(), "Run finished");
    Ok(outcome.exit_code())
}
