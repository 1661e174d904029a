//! Terminal prompts — implements the `SecretPrompt` port.

use anyhow::{Context, Result};
use dialoguer::Password;

use crate::application::ports::SecretPrompt;

/// Reads secrets from the controlling terminal without echo.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl SecretPrompt for TerminalPrompt {
    fn ask_password(&self, prompt: &str) -> Result<String> {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .context("cannot read password from terminal")
    }
}
