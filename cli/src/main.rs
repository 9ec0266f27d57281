use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod observability;
mod services;
mod ui;

use cli::{Cli, Commands};
use commands::check::CheckOptions;
use error::CheckError;

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Check {
            plans,
            config,
            safety_assured,
            schema_load,
            report_all,
            events,
        } => {
            commands::check::execute(CheckOptions {
                plans,
                config,
                safety_assured,
                schema_load,
                report_all,
                events,
            })
            .await?;
        }
        Commands::Rules => {
            commands::rules::execute()?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();

    if let Err(err) = run(cli).await {
        ui::print_error(&format!("{:#}", err));
        let code = err
            .downcast_ref::<CheckError>()
            .map(CheckError::exit_code)
            .unwrap_or(2);
        std::process::exit(code);
    }
}
