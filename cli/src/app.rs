//! Application context — unified state passed to the menu loop.

use crate::cli::Cli;
use crate::command_runner::TokioCommandRunner;
use crate::domain::ServiceDescriptor;
use crate::output::OutputContext;

/// Everything an operation needs: output, the command runner, and the
/// immutable service identity. Constructed once at startup.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Production command runner.
    pub runner: TokioCommandRunner,
    /// Identity of the one managed service.
    pub descriptor: ServiceDescriptor,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(cli: &Cli) -> Self {
        Self {
            output: OutputContext::new(cli.no_color, cli.quiet),
            runner: TokioCommandRunner::default(),
            descriptor: ServiceDescriptor::production(),
        }
    }
}
