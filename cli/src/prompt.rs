//! Request/response abstraction over interactive input.
//!
//! The lifecycle state machine never touches a terminal directly: it asks a
//! [`Prompter`] and receives a string back. Production uses dialoguer;
//! tests use a scripted prompter with a queue of canned answers.

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};

/// One prompt, one answer. Cancellation is expressed by the caller
/// validating the answer, not by the prompter.
pub trait Prompter {
    /// Ask for a line of input, echoed.
    ///
    /// # Errors
    ///
    /// Returns an error when the terminal is unavailable or input ends.
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Ask for a secret; input is not echoed.
    ///
    /// # Errors
    ///
    /// Returns an error when the terminal is unavailable or input ends.
    fn ask_secret(&mut self, prompt: &str) -> Result<String>;
}

/// Terminal prompter backed by dialoguer.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String> {
        let answer = Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?;
        Ok(answer)
    }
}
