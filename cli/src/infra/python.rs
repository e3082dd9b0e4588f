//! Runtime provisioner: the isolated Python environment.

use anyhow::Result;

use crate::command_runner::CommandRunner;
use crate::domain::{LifecycleError, ServiceDescriptor};

/// Provisions the virtualenv under the managed tree and keeps its
/// installed packages in line with the manifest.
pub struct PythonEnv<'a, R: CommandRunner> {
    runner: &'a R,
    desc: &'a ServiceDescriptor,
}

impl<'a, R: CommandRunner> PythonEnv<'a, R> {
    pub fn new(runner: &'a R, desc: &'a ServiceDescriptor) -> Self {
        Self { runner, desc }
    }

    /// Whether the isolated interpreter exists.
    #[must_use]
    pub fn is_provisioned(&self) -> bool {
        self.desc.venv_python().exists()
    }

    /// Ensure the environment exists and satisfies the manifest.
    ///
    /// Creation is idempotent; dependency installation re-runs on every
    /// pass so a changed manifest takes effect. The installer tool itself
    /// is upgraded first so installation does not fail on a stale pip.
    ///
    /// # Errors
    ///
    /// Any failing step surfaces as `ProvisioningFailed` and aborts the
    /// enclosing install/update before the unit is touched.
    pub async fn provision(&self) -> Result<()> {
        if !self.is_provisioned() {
            let venv_dir = self.desc.venv_dir();
            let venv_arg = venv_dir.to_string_lossy();
            let status = self
                .runner
                .run_streamed("python3", &["-m", "venv", &venv_arg])
                .await?;
            if !status.success() {
                return Err(LifecycleError::ProvisioningFailed(format!(
                    "python3 -m venv exited with {status}"
                ))
                .into());
            }
        }

        let pip = self.desc.venv_pip();
        let pip_arg = pip.to_string_lossy().to_string();

        let status = self
            .runner
            .run_streamed(&pip_arg, &["install", "--upgrade", "pip"])
            .await?;
        if !status.success() {
            return Err(LifecycleError::ProvisioningFailed(format!(
                "pip self-upgrade exited with {status}"
            ))
            .into());
        }

        let manifest = self.desc.manifest_path();
        let manifest_arg = manifest.to_string_lossy().to_string();
        let status = self
            .runner
            .run_streamed(&pip_arg, &["install", "-r", &manifest_arg])
            .await?;
        if !status.success() {
            return Err(LifecycleError::ProvisioningFailed(format!(
                "pip install -r {} exited with {status}",
                self.desc.manifest
            ))
            .into());
        }
        Ok(())
    }
}
