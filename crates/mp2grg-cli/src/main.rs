use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::FmtSubscriber;

use mp2grg_cli::{load_config, Cli, Settings};

mod commands;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let config = load_config(cli.config.as_deref())?;
    let settings = Settings::resolve(cli, config)?;

    // stdout carries only the translated document
    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    debug!(file = %cli.file.display(), ?settings, "starting translation");

    let stdout = io::stdout();
    let stderr = io::stderr();
    commands::translate::handle(
        &cli.file,
        cli.idempotent,
        &settings,
        &mut stdout.lock(),
        &mut stderr.lock(),
    )
}
