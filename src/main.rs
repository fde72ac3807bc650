//! Qualforge: LLM-assisted quality scaffolding for new projects.
//!
//! This is the main entry point for the `qualforge` CLI. It parses arguments,
//! installs logging and the Ctrl-C handler, dispatches to the appropriate
//! command handler, and handles errors with proper exit codes.

mod cli;
mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod generation;
pub mod generators;
pub mod journal;
pub mod llm;
mod logging;
pub mod pipeline;
pub mod prompt;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(err) = logging::init(cli.verbose, cli.log_format) {
        eprintln!("Warning: {:#}", err);
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    match commands::dispatch(cli.command, cancel).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
