//! Typed lifecycle errors.
//!
//! Every failure an operator can hit maps to one variant here. Messages
//! carry a recovery hint because the only recovery path is re-selecting a
//! menu action. All variants convert to `anyhow::Error` via `?`.

use thiserror::Error;

/// Errors produced by lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("botctl must run as root. Re-run with: sudo botctl")]
    Privilege,

    #[error("could not reach the source repository: {0}")]
    SourceUnavailable(String),

    #[error("synced tree is incomplete: missing {0}")]
    MalformedSource(String),

    #[error("dependency provisioning failed: {0}")]
    ProvisioningFailed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("service is not installed. Select Install first.")]
    NotInstalled,

    #[error("supervisor rejected the service definition: {0}")]
    RegistrationFailed(String),

    #[error("cancelled, nothing was changed")]
    Cancelled,
}

impl LifecycleError {
    /// Whether this error represents an operator declining a destructive
    /// action rather than a real failure.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
