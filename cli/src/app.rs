//! Application context — unified state passed to every command handler.
//!
//! `AppContext` bundles the terminal output context with the loaded
//! configuration so command handlers take one argument instead of many.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{KnifeServerConfig, expand_home};
use crate::infra::fs::LocalKeyStore;
use crate::infra::keys::RsaPublicKeyDeriver;
use crate::infra::prompt::TerminalPrompt;
use crate::infra::ssh::{Libssh2Transport, SshShellFactory};
use crate::output::{OutputContext, TerminalReporter};

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Configuration file contents, or defaults.
    pub config: KnifeServerConfig,
    /// Local key files.
    pub keys: LocalKeyStore,
    /// RSA public key derivation.
    pub deriver: RsaPublicKeyDeriver,
    /// Interactive password prompt.
    pub prompt: TerminalPrompt,
    home: Option<PathBuf>,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read.
    pub fn new(flags: &OutputFlags, config_store: &impl ConfigStore) -> Result<Self> {
        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            config: config_store.load()?,
            keys: LocalKeyStore,
            deriver: RsaPublicKeyDeriver,
            prompt: TerminalPrompt,
            home: dirs::home_dir(),
        })
    }

    /// Progress reporter writing to this context's terminal.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Factory for SSH executors honouring the configured timeout.
    #[must_use]
    pub fn shell_factory(&self) -> SshShellFactory {
        let timeout = self.config.ssh.timeout_secs.map(Duration::from_secs);
        SshShellFactory::new(Libssh2Transport::new().with_timeout(timeout))
    }

    /// Expands a leading `~` against the operator's home directory.
    #[must_use]
    pub fn expand(&self, path: &Path) -> PathBuf {
        expand_home(path, self.home.as_deref())
    }
}
