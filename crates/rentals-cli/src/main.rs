//! Rentals CLI - Command-line client for rental listings
//!
//! Works against the listings API when it is reachable and queues changes
//! locally when it is not.

mod cli;
mod commands;
mod error;


use std::time::Duration;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::{resolve_db_path, ClientOptions};
use crate::commands::completions::run_completions;
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::seed::run_seed;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::commands::update::run_update;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "rentals=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let options = ClientOptions {
        db_path: resolve_db_path(cli.db_path)?,
        api_url: cli.api_url,
        offline: cli.offline,
    };

    match cli.command {
        Commands::List {
            category,
            sort,
            order,
            json,
        } => {
            run_list(category, sort.map(Into::into), order.into(), json, &options).await?;
        }
        Commands::Add(args) => run_add(args, &options).await?,
        Commands::Update(args) => run_update(args, &options).await?,
        Commands::Delete { id } => run_delete(&id, &options).await?,
        Commands::Sync => run_sync(&options).await?,
        Commands::Status { json } => run_status(json, &options).await?,
        Commands::Seed { interval_ms, count } => {
            run_seed(Duration::from_millis(interval_ms), count, &options).await?;
        }
        Commands::Watch { interval } => {
            run_watch(interval.map(Duration::from_secs), &options).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
