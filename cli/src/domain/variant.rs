//! Chef server packaging generations and the remote commands each one needs.
//!
//! Every variant-dependent decision is a method on [`ServerVariant`] so that
//! adding a generation is an exhaustive-match compile error, not a missed
//! boolean check.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::connection::single_quote;
use crate::domain::error::{ConfigError, CredentialsError};

static CLIENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // compile-time constant pattern
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.@-]*$").expect("valid client name regex")
});

/// Server packaging generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerVariant {
    /// Chef 10 style install: `/etc/chef`, API on port 4000, `knife client`.
    Legacy,
    /// Self-contained omnibus package: `/etc/chef-server`, API on port 8000,
    /// `knife user`.
    Omnibus,
}

/// Where the private key of a new account comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// The server generates a key pair and writes the private half to the
    /// temporary key path.
    Generate,
    /// A public key already uploaded to the temporary key path is registered.
    Existing,
}

impl ServerVariant {
    /// Derives the variant from a configured server version: any major
    /// version above 10 is an omnibus install.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidServerVersion`] if the major version is
    /// not a number.
    pub fn from_server_version(version: &str) -> Result<Self, ConfigError> {
        let major = version
            .trim()
            .split('.')
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(|| ConfigError::InvalidServerVersion(version.to_string()))?;
        Ok(if major > 10 { Self::Omnibus } else { Self::Legacy })
    }

    /// Remote location of the validation key.
    #[must_use]
    pub fn validation_key_path(self) -> &'static str {
        match self {
            Self::Legacy => "/etc/chef/validation.pem",
            Self::Omnibus => "/etc/chef-server/chef-validator.pem",
        }
    }

    /// Only omnibus servers can register a key the operator already holds.
    #[must_use]
    pub fn supports_key_reuse(self) -> bool {
        match self {
            Self::Legacy => false,
            Self::Omnibus => true,
        }
    }

    /// Whether creating accounts needs the WebUI admin password.
    #[must_use]
    pub fn requires_webui_password(self) -> bool {
        self.supports_key_reuse()
    }

    /// One-shot `knife configure --initial` for the server's root client.
    #[must_use]
    pub fn root_client_command(self, webui_password: &str) -> String {
        match self {
            Self::Legacy => [
                "knife configure",
                "--initial",
                "--server-url http://127.0.0.1:4000",
                "--user root",
                r#"--repository """#,
                "--defaults --yes",
            ]
            .join(" "),
            Self::Omnibus => [
                format!("echo {} |", single_quote(webui_password)).as_str(),
                "knife configure",
                "--initial",
                "--server-url http://127.0.0.1:8000",
                "--user root",
                r#"--repository """#,
                "--admin-client-name chef-webui",
                "--admin-client-key /etc/chef-server/chef-webui.pem",
                "--validation-client-name chef-validator",
                "--validation-key /etc/chef-server/chef-validator.pem",
                "--defaults --yes 2>> /tmp/chef-server-install-errors.txt",
            ]
            .join(" "),
        }
    }

    /// Account creation for `user`, writing or reading the temporary key path.
    #[must_use]
    pub fn client_create_command(
        self,
        user: &str,
        source: KeySource,
        webui_password: &str,
    ) -> String {
        let key_path = temp_client_key_path(user);
        match self {
            Self::Legacy => format!(
                "knife client create {user} --admin --file {key_path} --disable-editing"
            ),
            Self::Omnibus => {
                let key_flag = match source {
                    KeySource::Generate => "--file",
                    KeySource::Existing => "--user-key",
                };
                format!(
                    "knife user create {user} --admin {key_flag} {key_path} --disable-editing --password {}",
                    single_quote(webui_password)
                )
            }
        }
    }
}

/// Temporary remote file holding a client's key during account creation.
#[must_use]
pub fn temp_client_key_path(user: &str) -> String {
    format!("/tmp/chef-client-{user}.pem")
}

/// Client names end up inside remote shell commands, so only a safe subset
/// is accepted.
///
/// # Errors
///
/// Returns [`CredentialsError::InvalidClientName`] for anything else.
pub fn validate_client_name(user: &str) -> Result<(), CredentialsError> {
    if CLIENT_NAME.is_match(user) {
        Ok(())
    } else {
        Err(CredentialsError::InvalidClientName(user.to_string()))
    }
}
