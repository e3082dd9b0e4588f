//! Shared mock infrastructure for unit tests.
//!
//! Provides a scripted [`CommandRunner`], a scripted [`Prompter`], and a
//! "healthy host" command handler that emulates git/python/systemctl with
//! real filesystem side effects under a relocated descriptor.

#![allow(clippy::expect_used)]
#![allow(dead_code)] // Not every test file uses every helper

use std::cell::RefCell;
use std::collections::VecDeque;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;

use botctl_cli::command_runner::CommandRunner;
use botctl_cli::domain::ServiceDescriptor;
use botctl_cli::output::OutputContext;
use botctl_cli::prompt::Prompter;

// ── Output helpers ────────────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(stderr: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(1 << 8),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

/// Quiet output context so tests don't spam the harness.
pub fn quiet_output() -> OutputContext {
    OutputContext::new(true, true)
}

/// Descriptor relocated under a tempdir root.
pub fn temp_descriptor(root: &Path) -> ServiceDescriptor {
    ServiceDescriptor {
        name: "panelbot".to_string(),
        repo_url: "https://example.invalid/panelbot.git".to_string(),
        install_dir: root.join("opt").join("panelbot"),
        unit_dir: root.join("etc").join("systemd").join("system"),
        entry_point: "bot.py".to_string(),
        manifest: "requirements.txt".to_string(),
    }
}

// ── Scripted runner ───────────────────────────────────────────────────────────

type Handler = Box<dyn FnMut(&str, &[&str]) -> Result<Output>>;

/// `CommandRunner` driven by a closure. Records every invocation as
/// `"program arg1 arg2 ..."` so tests can assert what was (not) run.
pub struct ScriptedRunner {
    calls: RefCell<Vec<String>>,
    handler: RefCell<Handler>,
}

impl ScriptedRunner {
    pub fn new(handler: impl FnMut(&str, &[&str]) -> Result<Output> + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            handler: RefCell::new(Box::new(handler)),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn dispatch(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.calls
            .borrow_mut()
            .push(format!("{program} {}", args.join(" ")));
        (self.handler.borrow_mut())(program, args)
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.dispatch(program, args)
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.dispatch(program, args)
    }

    async fn run_streamed(&self, program: &str, args: &[&str]) -> Result<ExitStatus> {
        self.dispatch(program, args).map(|o| o.status)
    }

    fn spawn_streamed(&self, _program: &str, _args: &[&str]) -> Result<tokio::process::Child> {
        anyhow::bail!("spawn not expected in this test")
    }
}

// ── Healthy host emulation ────────────────────────────────────────────────────

/// Command handler emulating a healthy host for `desc`:
/// clone materializes a valid tree, venv creation materializes the
/// interpreter, pip and systemctl succeed, `is-active` reports inactive.
pub fn healthy_handler(
    desc: ServiceDescriptor,
) -> impl FnMut(&str, &[&str]) -> Result<Output> + 'static {
    move |program: &str, args: &[&str]| -> Result<Output> {
        match (program, args.first().copied()) {
            ("git", Some("clone")) => {
                let dir = Path::new(args[2]);
                std::fs::create_dir_all(dir.join(".git")).expect("create .git");
                std::fs::write(dir.join(&desc.entry_point), b"print('bot')\n")
                    .expect("write entry point");
                std::fs::write(dir.join(&desc.manifest), b"python-telegram-bot\n")
                    .expect("write manifest");
                Ok(ok_output(b""))
            }
            ("git", Some("-C")) => match args.get(2).copied() {
                Some("symbolic-ref") => Ok(ok_output(b"origin/main\n")),
                _ => Ok(ok_output(b"")),
            },
            ("python3", Some("-m")) => {
                let dir = Path::new(args[2]);
                std::fs::create_dir_all(dir.join("bin")).expect("create venv bin");
                std::fs::write(dir.join("bin").join("python"), b"#!/bin/fake\n")
                    .expect("write interpreter");
                std::fs::write(dir.join("bin").join("pip"), b"#!/bin/fake\n")
                    .expect("write pip");
                Ok(ok_output(b""))
            }
            (p, Some("install")) if p.ends_with("pip") => Ok(ok_output(b"")),
            ("systemctl", Some("is-active")) => Ok(ok_output(b"inactive\n")),
            ("systemctl", _) => Ok(ok_output(b"")),
            _ => anyhow::bail!("unexpected command: {program} {}", args.join(" ")),
        }
    }
}

/// Runner emulating a healthy host.
pub fn healthy_host(desc: &ServiceDescriptor) -> ScriptedRunner {
    ScriptedRunner::new(healthy_handler(desc.clone()))
}

// ── Scripted prompter ─────────────────────────────────────────────────────────

/// Prompter answering from a fixed queue.
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, _prompt: &str) -> Result<String> {
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("prompter ran out of answers"))
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String> {
        self.ask(prompt)
    }
}
