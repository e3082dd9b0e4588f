//! Config store: the owner-only `.env` artifact holding credentials.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::command_runner::CommandRunner;
use crate::domain::{Credentials, LifecycleError, ServiceDescriptor};

/// Materializes and edits the persisted credentials artifact.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    #[must_use]
    pub fn new(desc: &ServiceDescriptor) -> Self {
        Self {
            path: desc.env_file(),
        }
    }

    /// Whether the artifact exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the artifact, replacing any prior content wholesale.
    ///
    /// The file is created with mode 0600 before a single byte is written,
    /// then moved into place, so there is no window in which credentials
    /// are group- or world-readable. Re-running install re-supplies full
    /// configuration; no merging with old content.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be written.
    pub fn write(&self, creds: &Credentials) -> Result<()> {
        use std::io::Write as _;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let temp_path = self.path.with_extension("env.tmp");
        let mut open = std::fs::OpenOptions::new();
        open.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            open.mode(0o600);
        }
        let mut file = open
            .open(&temp_path)
            .with_context(|| format!("creating {}", temp_path.display()))?;
        // create(true) reuses an existing tmp file with its old mode; force
        // the restrictive bits before writing.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }
        file.write_all(creds.to_env_file().as_bytes())
            .with_context(|| format!("writing {}", temp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("flushing {}", temp_path.display()))?;
        drop(file);

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing {}", self.path.display()))?;
        Ok(())
    }

    /// Open the artifact in the operator's editor.
    ///
    /// Edits never take effect on the running process by themselves; the
    /// caller restarts the service afterwards.
    ///
    /// # Errors
    ///
    /// `NotInstalled` when the artifact does not exist yet.
    pub async fn edit<R: CommandRunner>(&self, runner: &R) -> Result<()> {
        if !self.exists() {
            return Err(LifecycleError::NotInstalled.into());
        }
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
        let path_arg = self.path.to_string_lossy().to_string();
        let status = runner.run_streamed(&editor, &[&path_arg]).await?;
        if !status.success() {
            anyhow::bail!("editor {editor} exited with {status}");
        }
        Ok(())
    }
}
