//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::{Connection, KnifeServerConfig, SshError};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Result of piping a script through a remote shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Combined stdout and stderr, in arrival order.
    pub output: String,
    /// `None` when the remote process ended without reporting a status.
    pub exit_status: Option<i32>,
}

// ── Remote Execution Ports ────────────────────────────────────────────────────

/// Runs commands on one remote host.
///
/// Every call opens and tears down its own connection. Implementations
/// run commands as root, elevating non-root logins.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteShell {
    /// Run `command` and return its combined output.
    ///
    /// # Errors
    ///
    /// [`SshError::CommandFailed`] when the exit status is non-zero or
    /// missing; a connection-level [`SshError`] when the host cannot be
    /// reached or authenticated.
    fn execute(&self, command: &str) -> Result<String, SshError>;

    /// Pipe `script` into a remote shell and report what happened.
    ///
    /// A non-zero exit status is returned, not raised.
    ///
    /// # Errors
    ///
    /// Only connection-level [`SshError`]s.
    fn run_script(&self, script: &[u8]) -> Result<ScriptOutput, SshError>;
}

/// Builds a [`RemoteShell`] for a connection.
pub trait RemoteShellFactory {
    type Shell: RemoteShell;

    /// Bind a shell to `connection`. No network traffic happens here.
    fn shell_for(&self, connection: &Connection) -> Self::Shell;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Key Material Ports ────────────────────────────────────────────────────────

/// Local storage for key files.
///
/// Callers must serialize access to a given path; nothing here locks.
pub trait KeyStore {
    /// Returns `true` if a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
    /// Read the whole file.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying store.
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
    /// Byte-for-byte copy of `from` into `to`, replacing `to`.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying store.
    fn copy(&self, from: &Path, to: &Path) -> std::io::Result<()>;
    /// Replace `path` with `contents`, readable by the owner only.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying store.
    fn write_private(&self, path: &Path, contents: &[u8]) -> std::io::Result<()>;
}

/// Derives the public half of a private key.
pub trait PublicKeyDeriver {
    /// Return the PEM-encoded public key for a PEM-encoded private key.
    ///
    /// # Errors
    ///
    /// Returns an error if the private key cannot be parsed or encoded.
    fn public_key_pem(&self, private_pem: &str) -> Result<String>;
}

// ── Interaction Port ──────────────────────────────────────────────────────────

/// Asks the operator for a secret.
pub trait SecretPrompt {
    /// Prompt without echo and return what was typed.
    ///
    /// # Errors
    ///
    /// Returns an error if no terminal is available.
    fn ask_password(&self, prompt: &str) -> Result<String>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts where configuration comes from.
pub trait ConfigStore {
    /// Load configuration, falling back to defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<KnifeServerConfig>;

    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}
