use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;

use cli::{Args, Command};

/// Initialize tracing with two outputs:
/// 1. Console output (stderr) - progress while a command runs
/// 2. File output (~/.dbcycle/dbcycle.log) - full history of every run
///
/// The returned guard flushes the file writer when dropped.
fn initialize_tracing() -> Result<WorkerGuard> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,dbcycle_orchestrations=debug,dbcycle=debug".into());

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let log_dir = PathBuf::from(home).join(".dbcycle");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::never(&log_dir, "dbcycle.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_writer(file_writer).with_ansi(false);
    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let _guard = initialize_tracing()?;

    match args.command {
        Command::Rebuild { output } => commands::rebuild::run(output).await,
        Command::Database { output, show_secrets } => commands::inspect::run_database(output, show_secrets).await,
        Command::Services { output } => commands::inspect::run_services(output).await,
        Command::Owner { output } => commands::inspect::run_owner(output).await,
        Command::Config => commands::system::show_config(),
    }
}
