//! Command implementations

pub mod create_root_client;
pub mod detect_platform;
pub mod exec;
pub mod install_client_key;
pub mod install_validation_key;
pub mod setup;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{ProgressReporter, RemoteShellFactory};
use crate::application::services::credentials::{Credentials, LocalServices};
use crate::domain::config::DEFAULT_WEBUI_PASSWORD;
use crate::domain::{Connection, ServerVariant};

/// How to reach the Chef server.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Hostname or IP address of the Chef server
    #[arg(short = 'H', long, value_name = "FQDN_OR_IP")]
    pub host: String,

    /// SSH login account (default: root)
    #[arg(short = 'x', long = "ssh-user", value_name = "USERNAME")]
    pub ssh_user: Option<String>,

    /// SSH port (default: 22)
    #[arg(short = 'p', long = "ssh-port", value_name = "PORT")]
    pub ssh_port: Option<u16>,

    /// Private key to offer; may be repeated
    #[arg(short = 'i', long = "identity-file", value_name = "FILE")]
    pub identity_file: Vec<PathBuf>,

    /// SSH password, offered before any key
    #[arg(
        short = 'P',
        long = "ssh-password",
        env = "KNIFE_SERVER_SSH_PASSWORD",
        hide_env_values = true
    )]
    pub ssh_password: Option<String>,

    /// Skip the known_hosts check
    #[arg(long = "no-host-key-verify")]
    pub no_host_key_verify: bool,
}

impl TargetArgs {
    /// Merges flags over the `ssh` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is blank.
    pub fn connection(&self, app: &AppContext) -> Result<Connection> {
        let ssh = &app.config.ssh;
        let keys: Vec<PathBuf> = if self.identity_file.is_empty() {
            ssh.identity_file.iter().map(|p| app.expand(p)).collect()
        } else {
            self.identity_file.iter().map(|p| app.expand(p)).collect()
        };
        let connection = Connection::new(self.host.clone())?
            .with_user(self.ssh_user.clone().or_else(|| Some(ssh.user.clone())))
            .with_port(Some(self.ssh_port.unwrap_or(ssh.port)))
            .with_keys(keys)
            .with_password(self.ssh_password.clone())
            .with_host_key_verification(ssh.verify_host_key && !self.no_host_key_verify)
            .with_known_hosts(ssh.known_hosts.as_deref().map(|p| app.expand(p)));
        Ok(connection)
    }
}

/// Chef server settings shared by the credential commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ChefArgs {
    /// Chef server major version; above 10 selects the omnibus layout
    #[arg(long, value_name = "VERSION")]
    pub server_version: Option<String>,

    /// Initial password for the WebUI admin account (default: chefchef)
    #[arg(
        long,
        env = "KNIFE_SERVER_WEBUI_PASSWORD",
        hide_env_values = true,
        value_name = "PASSWORD"
    )]
    pub webui_password: Option<String>,

    /// Local path for the validation key
    #[arg(long, value_name = "FILE")]
    pub validation_key: Option<PathBuf>,
}

impl ChefArgs {
    /// Configured server version, flag first.
    #[must_use]
    pub fn server_version<'a>(&'a self, app: &'a AppContext) -> &'a str {
        self.server_version
            .as_deref()
            .unwrap_or(&app.config.chef.server_version)
    }

    /// # Errors
    ///
    /// Returns an error if the server version is not numeric.
    pub fn variant(&self, app: &AppContext) -> Result<ServerVariant> {
        Ok(ServerVariant::from_server_version(self.server_version(app))?)
    }

    /// WebUI password: flag or env, then config, then `chefchef`.
    #[must_use]
    pub fn webui_password(&self, app: &AppContext) -> String {
        self.webui_password
            .clone()
            .or_else(|| app.config.chef.webui_password.clone())
            .unwrap_or_else(|| DEFAULT_WEBUI_PASSWORD.to_string())
    }

    /// Validation key location with `~` expanded.
    #[must_use]
    pub fn validation_key(&self, app: &AppContext) -> PathBuf {
        app.expand(
            self.validation_key
                .as_deref()
                .unwrap_or(&app.config.chef.validation_key),
        )
    }

    /// Builds a credential provisioner bound to `connection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server version is not numeric.
    pub fn credentials<'a, F: RemoteShellFactory>(
        &self,
        app: &'a AppContext,
        factory: &F,
        connection: &Connection,
        reporter: &'a dyn ProgressReporter,
    ) -> Result<Credentials<'a, F::Shell>> {
        let variant = self.variant(app)?;
        tracing::debug!(?variant, "selected server layout");
        let local = LocalServices {
            keys: &app.keys,
            deriver: &app.deriver,
            reporter,
        };
        Ok(Credentials::new(
            factory.shell_for(connection),
            self.validation_key(app),
            variant,
            local,
        )
        .with_webui_password(Some(self.webui_password(app))))
    }
}

/// Which Chef client to create and where its key goes.
#[derive(Args, Debug, Clone, Default)]
pub struct ClientArgs {
    /// Client name to create on the server (default: chef.node_name)
    #[arg(short = 'N', long = "node-name", visible_alias = "user", value_name = "NAME")]
    pub node_name: Option<String>,

    /// Local path for the client key (default: ~/.chef/<NAME>.pem)
    #[arg(long, value_name = "FILE")]
    pub client_key: Option<PathBuf>,
}

impl ClientArgs {
    /// # Errors
    ///
    /// Returns an error if no node name is configured anywhere.
    pub fn node_name(&self, app: &AppContext) -> Result<String> {
        self.node_name
            .clone()
            .or_else(|| app.config.chef.node_name.clone())
            .context("You did not provide a valid --node-name value.")
    }

    /// Client key location with `~` expanded.
    #[must_use]
    pub fn client_key(&self, app: &AppContext, node_name: &str) -> PathBuf {
        let path = self
            .client_key
            .clone()
            .or_else(|| app.config.chef.client_key.clone())
            .unwrap_or_else(|| PathBuf::from(format!("~/.chef/{node_name}.pem")));
        app.expand(&path)
    }
}
