//! Configuration schema for knife-server.
//!
//! Pure types only — loading lives in `crate::infra::config`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::connection::{DEFAULT_PORT, DEFAULT_USER};

/// WebUI admin password used when nothing else is configured.
pub const DEFAULT_WEBUI_PASSWORD: &str = "chefchef";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.chef/knife-server.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KnifeServerConfig {
    /// How to reach the server.
    pub ssh: SshConfig,
    /// Chef identities and key locations.
    pub chef: ChefConfig,
}

/// SSH settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    pub user: String,
    pub port: u16,
    /// Private key offered during authentication.
    pub identity_file: Option<PathBuf>,
    pub verify_host_key: bool,
    /// Override for `~/.ssh/known_hosts`.
    pub known_hosts: Option<PathBuf>,
    /// Upper bound for each blocking SSH call. `None` waits forever.
    pub timeout_secs: Option<u64>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            port: DEFAULT_PORT,
            identity_file: None,
            verify_host_key: true,
            known_hosts: None,
            timeout_secs: None,
        }
    }
}

/// Chef settings, mirroring the values usually found in `knife.rb`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChefConfig {
    /// Client name created on the server for the operator.
    pub node_name: Option<String>,
    /// Local path of the validation key.
    pub validation_key: PathBuf,
    /// Local path of the operator's client key.
    pub client_key: Option<PathBuf>,
    /// Chef server major version; above 10 means omnibus.
    pub server_version: String,
    /// WebUI admin password for omnibus account creation.
    pub webui_password: Option<String>,
}

impl Default for ChefConfig {
    fn default() -> Self {
        Self {
            node_name: None,
            validation_key: PathBuf::from("~/.chef/validation.pem"),
            client_key: None,
            server_version: "10".to_string(),
            webui_password: None,
        }
    }
}

/// Expands a leading `~` against `home`.
#[must_use]
pub fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
