//! Environment probe: privilege level and working directory.
//!
//! Runs before anything mutating. Privilege failure is the one fatal
//! error: the process terminates instead of returning to the menu.

use anyhow::{Context, Result};

use crate::domain::LifecycleError;

/// Effective UID of this process, read from `/proc/self/status`.
///
/// The `Uid:` line carries real, effective, saved, and fs UIDs; the
/// second field is the effective one.
///
/// # Errors
///
/// Returns an error if the status file cannot be read or parsed.
pub fn effective_uid() -> Result<u32> {
    let status =
        std::fs::read_to_string("/proc/self/status").context("reading /proc/self/status")?;
    let uid_line = status
        .lines()
        .find(|line| line.starts_with("Uid:"))
        .ok_or_else(|| anyhow::anyhow!("no Uid line in /proc/self/status"))?;
    let euid = uid_line
        .split_whitespace()
        .nth(2)
        .ok_or_else(|| anyhow::anyhow!("malformed Uid line: {uid_line}"))?;
    euid.parse()
        .with_context(|| format!("parsing effective uid '{euid}'"))
}

/// Require an effective UID of 0.
///
/// # Errors
///
/// Returns [`LifecycleError::Privilege`] for any other UID.
pub fn require_root(euid: u32) -> Result<()> {
    if euid != 0 {
        return Err(LifecycleError::Privilege.into());
    }
    Ok(())
}

/// Normalize the working directory before mutating actions.
///
/// Relative paths must never resolve against wherever the operator
/// happened to launch the tool from.
///
/// # Errors
///
/// Returns an error if the directory change fails.
pub fn normalize_cwd() -> Result<()> {
    std::env::set_current_dir("/").context("changing working directory to /")
}
