//! aur-updater CLI entry point
//!
//! Parses arguments, runs the selected mode and turns setup errors into a
//! colored message with a suggestion. See [`aur_updater::cli`] for the flags.

use aur_updater::cli;
use aur_updater::core::user_friendly_error;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(code) => code,
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            ExitCode::FAILURE
        }
    }
}
