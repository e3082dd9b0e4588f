//! botctl - deployment lifecycle manager for the panelbot service

use std::process::ExitCode;

use clap::Parser;

use botctl_cli::app::AppContext;
use botctl_cli::cli::Cli;
use botctl_cli::infra::probe;
use botctl_cli::menu;
use botctl_cli::prompt::TerminalPrompter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let app = AppContext::new(&cli);

    // Privilege failure is fatal; everything else returns to the menu.
    let preflight = probe::effective_uid()
        .and_then(probe::require_root)
        .and_then(|()| probe::normalize_cwd());
    if let Err(e) = preflight {
        app.output.error(&format!("{e:#}"));
        return ExitCode::FAILURE;
    }

    let mut prompter = TerminalPrompter::new();
    if let Err(e) = menu::run(&app, &mut prompter).await {
        app.output.error(&format!("{e:#}"));
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
