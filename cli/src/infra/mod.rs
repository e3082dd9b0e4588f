//! Infrastructure adapters: privilege probe, git sync, runtime
//! provisioning, config store, and the systemd supervisor.
//!
//! Every external subsystem is reached through [`crate::command_runner::CommandRunner`]
//! so unit tests can substitute scripted runners.

pub mod config;
pub mod git;
pub mod probe;
pub mod python;
pub mod systemd;
