//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── SSH errors ────────────────────────────────────────────────────────────────

/// Errors raised while reaching or driving a remote host.
///
/// Everything except [`SshError::CommandFailed`] is a connection-level
/// failure: the remote command never ran.
#[derive(Debug, Error)]
pub enum SshError {
    #[error("Invalid SSH target: {0}")]
    InvalidTarget(String),

    #[error("Cannot connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("SSH handshake with {host} failed: {reason}")]
    Handshake { host: String, reason: String },

    #[error("Host key for {host} does not match known_hosts. Refusing to connect.")]
    HostKeyMismatch { host: String },

    #[error("Host key for {host} could not be checked against known_hosts.")]
    HostKeyUnknown { host: String },

    #[error("Failed to authenticate {user}@{host}")]
    AuthenticationFailed { user: String, host: String },

    #[error("Cannot open SSH channel on {host}: {reason}")]
    ChannelOpen { host: String, reason: String },

    #[error("SSH channel error on {host}: {reason}")]
    Channel { host: String, reason: String },

    #[error("SSH exited with code {} for [{command}]", exit_code_label(*.exit_code))]
    CommandFailed {
        exit_code: Option<i32>,
        command: String,
    },
}

impl SshError {
    /// Returns `true` for failures that happened before the remote command ran.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        !matches!(self, Self::CommandFailed { .. })
    }

    /// Returns `true` when the transport rejected every offered credential.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

fn exit_code_label(code: Option<i32>) -> String {
    code.map_or_else(|| "<none>".to_string(), |c| c.to_string())
}

// ── Credential errors ─────────────────────────────────────────────────────────

/// Errors raised while installing validation or client keys.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error(transparent)]
    Remote(#[from] SshError),

    #[error("Local file operation failed on {path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid client name '{0}': must match ^[A-Za-z0-9][A-Za-z0-9_.@-]*$")]
    InvalidClientName(String),

    #[error("The omnibus server needs a WebUI admin password to create accounts. Pass --webui-password.")]
    MissingWebuiPassword,

    #[error("Cannot derive a public key from {path}: {reason}")]
    KeyDerivation { path: PathBuf, reason: String },
}

impl CredentialsError {
    /// Wraps an I/O error with the local path it concerns.
    #[must_use]
    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }
}

// ── Platform errors ───────────────────────────────────────────────────────────

/// Errors raised while fingerprinting the remote operating system.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Could not determine the OS running on the target")]
    Undetectable,

    #[error("Unsupported platform '{0}'. Supported: debian, ubuntu, el, redhat, centos, solaris*, sles, suse")]
    Unsupported(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid chef server version '{0}': expected a version such as 10, 11 or 12.1")]
    InvalidServerVersion(String),
}
