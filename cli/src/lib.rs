//! botctl - deployment lifecycle manager for the panelbot service.
//!
//! Installs, updates, and operates one systemd-supervised bot on the local
//! host through an interactive menu. The lifecycle state machine lives in
//! [`lifecycle`]; external subsystems (git, python, systemd, the terminal)
//! are reached through narrow adapters in [`infra`] so the machine is
//! testable without a live host.

pub mod app;
pub mod cli;
pub mod command_runner;
pub mod domain;
pub mod infra;
pub mod lifecycle;
pub mod menu;
pub mod output;
pub mod prompt;
