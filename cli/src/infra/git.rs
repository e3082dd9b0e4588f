//! Repository sync: clone or fast-forward the managed tree.
//!
//! The local tree is a mirror of the remote's primary branch, nothing
//! more. Local edits are discarded by a hard reset on every sync; that is
//! what makes re-running install always safe.

use anyhow::{Context, Result};

use crate::command_runner::{CommandRunner, stderr_excerpt};
use crate::domain::{LifecycleError, ServiceDescriptor};

/// Syncs the service source tree from its fixed remote.
pub struct GitSync<'a, R: CommandRunner> {
    runner: &'a R,
    desc: &'a ServiceDescriptor,
}

impl<'a, R: CommandRunner> GitSync<'a, R> {
    pub fn new(runner: &'a R, desc: &'a ServiceDescriptor) -> Self {
        Self { runner, desc }
    }

    /// Whether the local path holds a checkout of the managed tree.
    #[must_use]
    pub fn is_checkout(&self) -> bool {
        self.desc.install_dir.join(".git").exists()
    }

    /// Ensure the local tree matches the remote's primary branch tip.
    ///
    /// Fresh path: any partial contents are discarded and a full clone is
    /// performed. Existing checkout: fetch plus hard reset. Either way the
    /// required files are verified afterwards, before any provisioning
    /// step can run against an incomplete tree.
    ///
    /// # Errors
    ///
    /// `SourceUnavailable` when the remote cannot be reached,
    /// `MalformedSource` when required files are missing after sync.
    pub async fn sync(&self) -> Result<()> {
        if self.is_checkout() {
            self.fetch_and_reset().await?;
        } else {
            self.fresh_clone().await?;
        }
        self.verify_required_files()
    }

    async fn fresh_clone(&self) -> Result<()> {
        let dir = &self.desc.install_dir;
        if dir.exists() {
            // A directory without .git is a partial or foreign tree;
            // discard it rather than clone into it.
            std::fs::remove_dir_all(dir)
                .with_context(|| format!("clearing partial tree {}", dir.display()))?;
        }
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let dir_arg = dir.to_string_lossy();
        let status = self
            .runner
            .run_streamed("git", &["clone", &self.desc.repo_url, &dir_arg])
            .await?;
        if !status.success() {
            return Err(LifecycleError::SourceUnavailable(format!(
                "git clone of {} exited with {status}",
                self.desc.repo_url
            ))
            .into());
        }
        Ok(())
    }

    async fn fetch_and_reset(&self) -> Result<()> {
        let dir = self.desc.install_dir.to_string_lossy().to_string();

        let status = self
            .runner
            .run_streamed("git", &["-C", &dir, "fetch", "--all", "--prune"])
            .await?;
        if !status.success() {
            return Err(LifecycleError::SourceUnavailable(format!(
                "git fetch exited with {status}"
            ))
            .into());
        }

        let target = self.remote_head(&dir).await;
        let reset = self
            .runner
            .run("git", &["-C", &dir, "reset", "--hard", &target])
            .await?;
        if !reset.status.success() {
            return Err(LifecycleError::SourceUnavailable(format!(
                "git reset --hard {target}: {}",
                stderr_excerpt(&reset)
            ))
            .into());
        }
        Ok(())
    }

    /// Resolve the remote's primary branch, falling back to `origin/main`
    /// when the symbolic ref is not recorded locally.
    async fn remote_head(&self, dir: &str) -> String {
        let result = self
            .runner
            .run(
                "git",
                &["-C", dir, "symbolic-ref", "--short", "refs/remotes/origin/HEAD"],
            )
            .await;
        match result {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            }
            _ => "origin/main".to_string(),
        }
    }

    /// The entry point and the dependency manifest must both exist after a
    /// sync; anything else means the remote tree is not the service we
    /// manage.
    fn verify_required_files(&self) -> Result<()> {
        for path in [self.desc.entry_path(), self.desc.manifest_path()] {
            if !path.exists() {
                return Err(LifecycleError::MalformedSource(path.display().to_string()).into());
            }
        }
        Ok(())
    }
}
