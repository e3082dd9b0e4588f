//! Systemd adapter: unit registration and supervisor control.
//!
//! All supervisor interaction is keyed by the fixed unit name and routed
//! through the [`CommandRunner`] so tests never need a live systemd.

use anyhow::{Context, Result};

use crate::command_runner::{CommandRunner, SERVICE_OP_TIMEOUT, stderr_excerpt};
use crate::domain::{LifecycleError, ServiceDescriptor, render_unit};

/// Supervisor-reported activity of the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveState {
    Active,
    Inactive,
    Unknown,
}

/// Outcome of a registration pass.
#[derive(Debug, Clone, Copy)]
pub struct RegisterOutcome {
    /// Whether boot-time autostart was enabled. Enabling can fail without
    /// failing the install; the service still starts in this session.
    pub enabled: bool,
}

/// Systemd-backed registrar and supervisor control.
pub struct Systemd<'a, R: CommandRunner> {
    runner: &'a R,
    desc: &'a ServiceDescriptor,
}

impl<'a, R: CommandRunner> Systemd<'a, R> {
    pub fn new(runner: &'a R, desc: &'a ServiceDescriptor) -> Self {
        Self { runner, desc }
    }

    /// Whether a unit file is installed for the service.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.desc.unit_path().exists()
    }

    /// Generate and install the unit, reload supervisor metadata, and
    /// enable boot-time autostart.
    ///
    /// The unit text is regenerated whole from current inputs on every
    /// call; there is no partial-field patching, so the installed unit can
    /// never drift from the provisioned state.
    ///
    /// # Errors
    ///
    /// `RegistrationFailed` when the unit cannot be written or the
    /// supervisor rejects the reload. A failed enable is reported in the
    /// outcome, not as an error.
    pub async fn register(&self) -> Result<RegisterOutcome> {
        let unit_path = self.desc.unit_path();
        if let Some(parent) = unit_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(&unit_path, render_unit(self.desc)).map_err(|e| {
            LifecycleError::RegistrationFailed(format!(
                "writing {}: {e}",
                unit_path.display()
            ))
        })?;

        self.daemon_reload().await?;

        let unit = self.desc.unit_name();
        let enable = self.runner.run("systemctl", &["enable", &unit]).await;
        let enabled = matches!(enable, Ok(ref o) if o.status.success());
        Ok(RegisterOutcome { enabled })
    }

    /// Reload supervisor metadata.
    ///
    /// # Errors
    ///
    /// `RegistrationFailed` when the supervisor rejects the reload.
    pub async fn daemon_reload(&self) -> Result<()> {
        let output = self.runner.run("systemctl", &["daemon-reload"]).await?;
        if !output.status.success() {
            return Err(
                LifecycleError::RegistrationFailed(stderr_excerpt(&output)).into(),
            );
        }
        Ok(())
    }

    /// Start the unit.
    ///
    /// # Errors
    ///
    /// Returns an error when the supervisor reports failure.
    pub async fn start(&self) -> Result<()> {
        self.service_op("start").await
    }

    /// Stop the unit.
    ///
    /// # Errors
    ///
    /// Returns an error when the supervisor reports failure.
    pub async fn stop(&self) -> Result<()> {
        self.service_op("stop").await
    }

    /// Restart the unit.
    ///
    /// # Errors
    ///
    /// Returns an error when the supervisor reports failure.
    pub async fn restart(&self) -> Result<()> {
        self.service_op("restart").await
    }

    async fn service_op(&self, verb: &str) -> Result<()> {
        let unit = self.desc.unit_name();
        let output = self
            .runner
            .run_with_timeout("systemctl", &[verb, &unit], SERVICE_OP_TIMEOUT)
            .await?;
        if !output.status.success() {
            anyhow::bail!("systemctl {verb} {unit}: {}", stderr_excerpt(&output));
        }
        Ok(())
    }

    /// Disable boot-time autostart. Tolerates an already-disabled or
    /// unknown unit.
    pub async fn disable(&self) {
        let unit = self.desc.unit_name();
        let _ = self.runner.run("systemctl", &["disable", &unit]).await;
    }

    /// Query supervisor-reported activity.
    ///
    /// `systemctl is-active` exits non-zero for anything but an active
    /// unit, so the exit status alone is not an error here.
    pub async fn active_state(&self) -> ActiveState {
        let unit = self.desc.unit_name();
        let Ok(output) = self.runner.run("systemctl", &["is-active", &unit]).await else {
            return ActiveState::Unknown;
        };
        let state = String::from_utf8_lossy(&output.stdout);
        match state.trim() {
            "active" | "activating" | "reloading" => ActiveState::Active,
            "inactive" | "failed" | "deactivating" => ActiveState::Inactive,
            _ => ActiveState::Unknown,
        }
    }

    /// Stream `systemctl status` to the terminal.
    ///
    /// Exit status is ignored: systemctl exits 3 for a stopped unit and 4
    /// for an unknown one, and the printed output already says so.
    ///
    /// # Errors
    ///
    /// Returns an error only if systemctl cannot be spawned.
    pub async fn status_passthrough(&self) -> Result<()> {
        let unit = self.desc.unit_name();
        let _ = self
            .runner
            .run_streamed("systemctl", &["status", &unit, "--no-pager"])
            .await?;
        Ok(())
    }

    /// Follow the unit's journal until the operator interrupts.
    ///
    /// The child inherits the terminal; Ctrl-C both signals the child's
    /// process group and resolves our signal future, after which the child
    /// is reaped and control returns to the menu.
    ///
    /// The first call to `tokio::signal::ctrl_c` replaces the process's
    /// default SIGINT disposition for the rest of the session: after one
    /// log-follow round, Ctrl-C at the menu prompt no longer terminates
    /// the process. Streamed children still receive SIGINT directly and
    /// exit on their own.
    ///
    /// # Errors
    ///
    /// Returns an error if journalctl cannot be spawned or the signal
    /// handler cannot be installed.
    pub async fn follow_logs(&self) -> Result<()> {
        let unit = self.desc.unit_name();
        let mut child = self
            .runner
            .spawn_streamed("journalctl", &["-u", &unit, "-f", "--no-pager"])?;

        tokio::select! {
            status = child.wait() => {
                status.context("waiting for journalctl")?;
            }
            result = tokio::signal::ctrl_c() => {
                result.context("installing Ctrl-C handler")?;
                let _ = child.kill().await;
                let _ = child.wait().await;
            }
        }
        Ok(())
    }

    /// Remove the unit file and reload supervisor metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit file cannot be removed or the reload
    /// is rejected.
    pub async fn unregister(&self) -> Result<()> {
        let unit_path = self.desc.unit_path();
        if unit_path.exists() {
            std::fs::remove_file(&unit_path)
                .with_context(|| format!("removing {}", unit_path.display()))?;
        }
        self.daemon_reload().await
    }
}
