//! Lifecycle state machine for the managed service.
//!
//! Composes the infra adapters in safe order and enforces preconditions.
//! Every operation re-derives installation state from ground truth and is
//! re-entrant: failed stages are recovered by re-selecting the action, not
//! by rollback, because each stage is independently idempotent. The unit
//! definition is only written after sync and provisioning succeed, so a
//! previously registered service is never left half-registered by a failed
//! later stage.

use anyhow::{Context, Result};

use crate::command_runner::CommandRunner;
use crate::domain::{
    Credentials, InstallationState, LifecycleError, ServiceDescriptor, validate_operator_id,
    validate_token,
};
use crate::infra::config::ConfigStore;
use crate::infra::git::GitSync;
use crate::infra::python::PythonEnv;
use crate::infra::systemd::{ActiveState, Systemd};
use crate::output::OutputContext;
use crate::prompt::Prompter;

/// Exact token required to confirm removal.
pub const REMOVE_CONFIRMATION: &str = "yes";

/// The operator-facing state machine.
pub struct LifecycleController<'a, R: CommandRunner> {
    desc: &'a ServiceDescriptor,
    runner: &'a R,
    out: &'a OutputContext,
}

impl<'a, R: CommandRunner> LifecycleController<'a, R> {
    pub fn new(desc: &'a ServiceDescriptor, runner: &'a R, out: &'a OutputContext) -> Self {
        Self { desc, runner, out }
    }

    fn git(&self) -> GitSync<'a, R> {
        GitSync::new(self.runner, self.desc)
    }

    fn python(&self) -> PythonEnv<'a, R> {
        PythonEnv::new(self.runner, self.desc)
    }

    fn systemd(&self) -> Systemd<'a, R> {
        Systemd::new(self.runner, self.desc)
    }

    fn config(&self) -> ConfigStore {
        ConfigStore::new(self.desc)
    }

    /// Derive the installation state from filesystem and supervisor ground
    /// truth. Nothing here is cached between operations.
    pub async fn state(&self) -> InstallationState {
        if !self.git().is_checkout() {
            return InstallationState::Absent;
        }
        if !self.python().is_provisioned() {
            return InstallationState::Cloned;
        }
        if !self.systemd().is_registered() {
            return InstallationState::Provisioned;
        }
        match self.systemd().active_state().await {
            ActiveState::Active => InstallationState::Running,
            ActiveState::Inactive => InstallationState::Stopped,
            ActiveState::Unknown => InstallationState::Registered,
        }
    }

    /// Full install: sync, provision, capture config, register, restart.
    ///
    /// Valid from any state; running it on an already-running service is a
    /// full re-provisioning, not an error.
    ///
    /// # Errors
    ///
    /// Reports the failing stage and leaves earlier stages' artifacts in
    /// place; they are independently valid and safe to re-run.
    pub async fn install(&self, prompter: &mut dyn Prompter) -> Result<()> {
        self.out.info("Syncing source tree...");
        self.git().sync().await?;

        self.out.info("Provisioning runtime environment...");
        self.python().provision().await?;

        let creds = self.prompt_credentials(prompter)?;
        self.config().write(&creds)?;
        self.out.success("Configuration saved.");

        self.out.info("Registering service...");
        let outcome = self.systemd().register().await?;
        if !outcome.enabled {
            self.out
                .warn("Could not enable boot-time autostart; the service still runs this session.");
        }

        self.systemd().restart().await?;
        self.out.success(&format!("{} is running.", self.desc.name));
        self.out.kv("unit      ", &self.desc.unit_name());
        self.out
            .kv("tree      ", &self.desc.install_dir.display().to_string());
        self.out.info("View logs or edit config from the menu.");
        Ok(())
    }

    /// Update: re-sync and re-provision an existing installation, then
    /// restart. Configuration and registration are assumed stable across
    /// updates and are not touched.
    ///
    /// # Errors
    ///
    /// `NotInstalled` when no valid checkout exists; stage errors
    /// otherwise.
    pub async fn update(&self) -> Result<()> {
        if !self.git().is_checkout() {
            return Err(LifecycleError::NotInstalled.into());
        }
        self.out.info("Syncing source tree...");
        self.git().sync().await?;

        self.out.info("Provisioning runtime environment...");
        self.python().provision().await?;

        self.systemd().restart().await?;
        self.out.success("Update applied; service restarted.");
        Ok(())
    }

    /// Open the config artifact in the editor, then restart so the running
    /// process picks up the changes.
    ///
    /// # Errors
    ///
    /// `NotInstalled` when the artifact does not exist.
    pub async fn edit_config(&self) -> Result<()> {
        self.config().edit(self.runner).await?;
        self.systemd().restart().await?;
        self.out.success("Configuration updated; service restarted.");
        Ok(())
    }

    /// Start the unit.
    ///
    /// # Errors
    ///
    /// Propagates supervisor failures, including "unit not found".
    pub async fn start(&self) -> Result<()> {
        self.systemd().start().await?;
        self.out.success("Service started.");
        Ok(())
    }

    /// Stop the unit.
    ///
    /// # Errors
    ///
    /// Propagates supervisor failures.
    pub async fn stop(&self) -> Result<()> {
        self.systemd().stop().await?;
        self.out.success("Service stopped.");
        Ok(())
    }

    /// Restart the unit.
    ///
    /// # Errors
    ///
    /// Propagates supervisor failures.
    pub async fn restart(&self) -> Result<()> {
        self.systemd().restart().await?;
        self.out.success("Service restarted.");
        Ok(())
    }

    /// Show derived state plus the supervisor's own status output.
    ///
    /// # Errors
    ///
    /// Returns an error only if systemctl cannot be spawned.
    pub async fn status(&self) -> Result<()> {
        let state = self.state().await;
        self.out.kv("state     ", state.display());
        if self.systemd().is_registered() {
            self.systemd().status_passthrough().await?;
        }
        Ok(())
    }

    /// Follow the service journal until interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal follower cannot be spawned.
    pub async fn logs(&self) -> Result<()> {
        self.out.info("Following logs; press Ctrl-C to return.");
        self.systemd().follow_logs().await
    }

    /// Remove the installation: unit, tree, runtime env, and config.
    ///
    /// Destructive and irreversible, so it requires the exact
    /// confirmation token first. Anything else cancels with zero side
    /// effects.
    ///
    /// # Errors
    ///
    /// `Cancelled` when the confirmation does not match; filesystem or
    /// supervisor errors otherwise.
    pub async fn remove(&self, prompter: &mut dyn Prompter) -> Result<()> {
        self.out.warn(&format!(
            "This permanently removes {}, its runtime environment, and its configuration.",
            self.desc.install_dir.display()
        ));
        let answer = prompter.ask(&format!("Type '{REMOVE_CONFIRMATION}' to confirm"))?;
        if answer.trim() != REMOVE_CONFIRMATION {
            return Err(LifecycleError::Cancelled.into());
        }

        // Stop and disable are tolerated failures: the unit may already be
        // stopped, or never have been registered.
        if self.systemd().is_registered() {
            let _ = self.systemd().stop().await;
            self.systemd().disable().await;
            self.systemd().unregister().await?;
        }

        if self.desc.install_dir.exists() {
            std::fs::remove_dir_all(&self.desc.install_dir)
                .with_context(|| format!("removing {}", self.desc.install_dir.display()))?;
        }

        self.out.success("Service removed.");
        Ok(())
    }

    fn prompt_credentials(&self, prompter: &mut dyn Prompter) -> Result<Credentials> {
        let token = validate_token(&prompter.ask_secret("Bot token")?)?;
        let operator_id = validate_operator_id(&prompter.ask("Admin chat id")?)?;
        Ok(Credentials { token, operator_id })
    }
}
