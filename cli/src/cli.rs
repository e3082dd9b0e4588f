//! CLI argument parsing with clap derive.
//!
//! There are no subcommands: the surface is the interactive menu. Flags
//! only shape output.

use clap::Parser;

/// Deployment lifecycle manager for the panelbot service
#[derive(Parser)]
#[command(name = "botctl", version)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}
