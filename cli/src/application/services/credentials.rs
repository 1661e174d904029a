//! Credential provisioning — moves validation and client keys between a
//! freshly bootstrapped Chef server and the operator's workstation.
//!
//! Local key files are never overwritten without a timestamped sibling
//! backup, and the temporary key file used during account creation is
//! always removed from the server.

use std::path::{Path, PathBuf};

use crate::application::ports::{KeyStore, ProgressReporter, PublicKeyDeriver, RemoteShell};
use crate::domain::backup::{BackupSuffix, backup_path};
use crate::domain::connection::single_quote;
use crate::domain::error::CredentialsError;
use crate::domain::variant::{KeySource, ServerVariant, temp_client_key_path, validate_client_name};

/// Local collaborators used by [`Credentials`].
#[derive(Clone, Copy)]
pub struct LocalServices<'a> {
    pub keys: &'a dyn KeyStore,
    pub deriver: &'a dyn PublicKeyDeriver,
    pub reporter: &'a dyn ProgressReporter,
}

/// Installs Chef credentials through a [`RemoteShell`].
pub struct Credentials<'a, S: RemoteShell> {
    shell: S,
    validation_key_path: PathBuf,
    variant: ServerVariant,
    webui_password: Option<String>,
    local: LocalServices<'a>,
}

impl<'a, S: RemoteShell> Credentials<'a, S> {
    #[must_use]
    pub fn new(
        shell: S,
        validation_key_path: impl Into<PathBuf>,
        variant: ServerVariant,
        local: LocalServices<'a>,
    ) -> Self {
        Self {
            shell,
            validation_key_path: validation_key_path.into(),
            variant,
            webui_password: None,
            local,
        }
    }

    /// Sets the WebUI admin password used by omnibus account creation.
    #[must_use]
    pub fn with_webui_password(mut self, password: Option<String>) -> Self {
        self.webui_password = password;
        self
    }

    /// Copies the server's validation key to the local validation key path,
    /// backing up any existing file first.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::Remote`] if the key cannot be read from
    /// the server and [`CredentialsError::LocalIo`] if the backup or the
    /// write fails.
    pub fn install_validation_key(&self, suffix: &BackupSuffix) -> Result<(), CredentialsError> {
        let local_path = self.validation_key_path.as_path();
        self.backup_if_present(local_path, suffix)?;

        let remote_path = self.variant.validation_key_path();
        self.local
            .reporter
            .step(&format!("Fetching validation key {remote_path} from server"));
        let key = self.shell.execute(&format!("cat {remote_path}"))?;

        self.write_key(local_path, key.as_bytes())?;
        self.local.reporter.success(&format!(
            "Installed validation key to {}",
            local_path.display()
        ));
        tracing::info!(path = %local_path.display(), "validation key installed");
        Ok(())
    }

    /// Runs the server's one-time `knife configure --initial` and returns
    /// whatever it printed.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::MissingWebuiPassword`] on omnibus servers
    /// without a password, or [`CredentialsError::Remote`] if the command
    /// fails.
    pub fn create_root_client(&self) -> Result<String, CredentialsError> {
        let password = self.webui_password()?;
        self.local.reporter.step("Creating root client on server");
        let output = self
            .shell
            .execute(&self.variant.root_client_command(password))?;
        Ok(output)
    }

    /// Creates the `user` account on the server and installs its private
    /// key at `local_key_path`.
    ///
    /// On omnibus servers an existing local key is kept and its public half
    /// registered instead. The temporary key on the server is removed on
    /// every path.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialsError`] for invalid names, missing passwords,
    /// remote failures, key derivation failures and local I/O failures. A
    /// failure after the account was created leaves the account in place.
    pub fn install_client_key(
        &self,
        user: &str,
        local_key_path: &Path,
        suffix: &BackupSuffix,
    ) -> Result<(), CredentialsError> {
        validate_client_name(user)?;
        let password = self.webui_password()?;

        let reuse = self.variant.supports_key_reuse() && self.local.keys.exists(local_key_path);
        let outcome = if reuse {
            self.register_existing_key(user, local_key_path, password)
        } else {
            self.generate_client_key(user, local_key_path, password, suffix)
        };

        let cleanup = self.remove_temp_key(user);
        match (outcome, cleanup) {
            (Ok(()), cleanup) => cleanup,
            (Err(err), Err(cleanup_err)) => {
                tracing::warn!(user, error = %cleanup_err, "temporary client key left on server");
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
        }
    }

    fn generate_client_key(
        &self,
        user: &str,
        local_key_path: &Path,
        password: &str,
        suffix: &BackupSuffix,
    ) -> Result<(), CredentialsError> {
        self.local
            .reporter
            .step(&format!("Creating client {user} on server"));
        self.shell.execute(
            &self
                .variant
                .client_create_command(user, KeySource::Generate, password),
        )?;

        self.backup_if_present(local_key_path, suffix)?;

        let key = self
            .shell
            .execute(&format!("cat {}", temp_client_key_path(user)))?;
        self.write_key(local_key_path, key.as_bytes())?;
        self.local.reporter.success(&format!(
            "Installed {user} client key to {}",
            local_key_path.display()
        ));
        tracing::info!(user, path = %local_key_path.display(), "client key installed");
        Ok(())
    }

    fn register_existing_key(
        &self,
        user: &str,
        local_key_path: &Path,
        password: &str,
    ) -> Result<(), CredentialsError> {
        let private_pem = self
            .local
            .keys
            .read(local_key_path)
            .map_err(|e| CredentialsError::local_io(local_key_path, e))?;
        let private_pem = String::from_utf8_lossy(&private_pem);
        let public_pem = self
            .local
            .deriver
            .public_key_pem(&private_pem)
            .map_err(|e| CredentialsError::KeyDerivation {
                path: local_key_path.to_path_buf(),
                reason: format!("{e:#}"),
            })?;

        let remote_path = temp_client_key_path(user);
        self.local.reporter.step(&format!(
            "Uploading public key for pre-existing {} key",
            local_key_path.display()
        ));
        self.shell.execute(&format!(
            "echo {} > {remote_path}",
            single_quote(public_pem.trim())
        ))?;

        self.local
            .reporter
            .step(&format!("Creating client {user} on server"));
        self.shell.execute(
            &self
                .variant
                .client_create_command(user, KeySource::Existing, password),
        )?;
        self.local.reporter.success(&format!(
            "Registered existing key {} for {user}",
            local_key_path.display()
        ));
        Ok(())
    }

    fn remove_temp_key(&self, user: &str) -> Result<(), CredentialsError> {
        self.shell
            .execute(&format!("rm -f {}", temp_client_key_path(user)))?;
        Ok(())
    }

    /// Copies `path` to its backup location if it exists.
    fn backup_if_present(
        &self,
        path: &Path,
        suffix: &BackupSuffix,
    ) -> Result<Option<PathBuf>, CredentialsError> {
        if !self.local.keys.exists(path) {
            return Ok(None);
        }
        let backup = backup_path(path, suffix);
        self.local.reporter.step(&format!(
            "Creating backup of {} locally at {}",
            path.display(),
            backup.display()
        ));
        self.local
            .keys
            .copy(path, &backup)
            .map_err(|e| CredentialsError::local_io(&backup, e))?;
        Ok(Some(backup))
    }

    fn write_key(&self, path: &Path, contents: &[u8]) -> Result<(), CredentialsError> {
        self.local
            .keys
            .write_private(path, contents)
            .map_err(|e| CredentialsError::local_io(path, e))
    }

    /// Password for account creation; legacy servers never need one.
    fn webui_password(&self) -> Result<&str, CredentialsError> {
        if !self.variant.requires_webui_password() {
            return Ok("");
        }
        self.webui_password
            .as_deref()
            .ok_or(CredentialsError::MissingWebuiPassword)
    }
}
