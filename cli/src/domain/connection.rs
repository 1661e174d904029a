//! SSH target description and the command wrappers derived from it.
//!
//! Pure functions only — no I/O, no network access.

use std::path::PathBuf;

use crate::domain::error::SshError;

/// Login account used when none is given.
pub const DEFAULT_USER: &str = "root";

/// SSH port used when none is given.
pub const DEFAULT_PORT: u16 = 22;

/// Privilege-elevation prefix used for every non-root login.
pub const SUDO_PREFIX: &str = r#"sudo USER=root HOME="$(getent passwd root | cut -d : -f 6)""#;

/// One remote host plus the credentials used to reach it.
///
/// Built fresh for every logical operation and never pooled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Hostname or IP address.
    pub host: String,
    /// Login account.
    pub user: String,
    /// SSH port.
    pub port: u16,
    /// Private key files offered in order.
    pub keys: Vec<PathBuf>,
    /// Password offered before any key.
    pub password: Option<String>,
    /// Check the server host key against `known_hosts`.
    pub verify_host_key: bool,
    /// Override for the `known_hosts` file (defaults to `~/.ssh/known_hosts`).
    pub known_hosts: Option<PathBuf>,
}

impl Connection {
    /// Creates a connection to `host` as `root` on port 22.
    ///
    /// # Errors
    ///
    /// Returns [`SshError::InvalidTarget`] if `host` is blank.
    pub fn new(host: impl Into<String>) -> Result<Self, SshError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(SshError::InvalidTarget("host cannot be empty".to_string()));
        }
        Ok(Self {
            host,
            user: DEFAULT_USER.to_string(),
            port: DEFAULT_PORT,
            keys: Vec::new(),
            password: None,
            verify_host_key: true,
            known_hosts: None,
        })
    }

    /// Sets the login account; `None` keeps `root`.
    #[must_use]
    pub fn with_user(mut self, user: Option<String>) -> Self {
        if let Some(user) = user.filter(|u| !u.trim().is_empty()) {
            self.user = user;
        }
        self
    }

    /// Sets the port; `None` keeps 22.
    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    #[must_use]
    pub fn with_keys(mut self, keys: Vec<PathBuf>) -> Self {
        self.keys = keys;
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    #[must_use]
    pub fn with_host_key_verification(mut self, verify: bool) -> Self {
        self.verify_host_key = verify;
        self
    }

    #[must_use]
    pub fn with_known_hosts(mut self, path: Option<PathBuf>) -> Self {
        self.known_hosts = path;
        self
    }

    /// Returns `true` when the login account is `root`.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.user == DEFAULT_USER
    }

    /// `user@host:port`, for messages.
    #[must_use]
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Wraps `command` so it runs as root when `user` is not root.
///
/// Root logins get the command unchanged. Everything else becomes
/// `sudo USER=root HOME=... bash -c '<command>'`, with embedded single
/// quotes closed, escaped and reopened.
#[must_use]
pub fn elevate(user: &str, command: &str) -> String {
    if user == DEFAULT_USER {
        command.to_string()
    } else {
        format!("{SUDO_PREFIX} bash -c {}", single_quote(command))
    }
}

/// Wraps `value` in single quotes for a POSIX shell.
#[must_use]
pub fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Shell snippet that runs whatever arrives on standard input.
///
/// Picks `/dev/fd/0`, falls back to `/dev/stdin`, and exits 127 when the
/// host exposes neither.
const STDIN_RUNNER: &str = "if [ -e /dev/fd/0 ]; then sh /dev/fd/0; \
elif [ -e /dev/stdin ]; then sh /dev/stdin; \
else echo \"Cannot find a usable standard input device\" >&2; exit 127; fi";

/// Command line that executes a script piped over the channel's stdin.
#[must_use]
pub fn stdin_script_wrapper(user: &str) -> String {
    let runner = format!("sh -c {}", single_quote(STDIN_RUNNER));
    if user == DEFAULT_USER {
        runner
    } else {
        format!("{SUDO_PREFIX} {runner}")
    }
}
