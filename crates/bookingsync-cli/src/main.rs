//! bookingsync CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use bookingsync_cli::cli::{Cli, Command, ConfigAction};
use bookingsync_cli::commands;
use bookingsync_cli::config::AppConfig;
use bookingsync_cli::error::CliResult;
use bookingsync_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match (&cli.command, cli.debug) {
        (_, true) => TracingConfig::cli_debug(),
        (Command::Serve { .. }, false) => TracingConfig::server(),
        _ => TracingConfig::default(),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = if cli.config.is_some() {
        AppConfig::load_from(&path)?
    } else {
        AppConfig::load()?
    };

    match cli.command {
        Command::Run { dry_run, json } => commands::run::run(&config, dry_run, json).await,
        Command::Serve { bind, interval } => commands::serve::serve(&config, bind, interval).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&path),
        },
    }
}
