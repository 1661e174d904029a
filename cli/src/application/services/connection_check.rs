//! Pre-flight SSH check with a single interactive password fallback.

use anyhow::{Context, Result};

use crate::application::ports::{ProgressReporter, RemoteShell, RemoteShellFactory, SecretPrompt};
use crate::domain::Connection;

/// Command used to prove the connection works.
pub const PROBE_COMMAND: &str = "hostname -f";

/// Runs [`PROBE_COMMAND`] against `connection`.
///
/// When the host rejects every credential, the operator is asked for a
/// password once and the probe is repeated with it. Returns the connection
/// that worked, including the password if one was entered.
///
/// # Errors
///
/// Returns the underlying [`crate::domain::SshError`] for any failure other
/// than the first authentication failure, and prompt errors as-is.
pub fn verify_connection<F: RemoteShellFactory>(
    factory: &F,
    connection: Connection,
    prompt: &dyn SecretPrompt,
    reporter: &dyn ProgressReporter,
) -> Result<Connection> {
    reporter.step(&format!("Checking SSH access to {}", connection.display_target()));
    match factory.shell_for(&connection).execute(PROBE_COMMAND) {
        Ok(hostname) => {
            reporter.success(&format!("Connected to {}", hostname.trim()));
            Ok(connection)
        }
        Err(err) if err.is_authentication_failure() => {
            tracing::warn!(user = %connection.user, host = %connection.host, "authentication failed, falling back to password");
            reporter.warn(&format!(
                "Failed to authenticate {} - trying password auth",
                connection.user
            ));
            let password = prompt
                .ask_password(&format!(
                    "Enter password for {}@{}",
                    connection.user, connection.host
                ))
                .context("reading SSH password")?;
            let connection = connection.with_password(Some(password));
            let hostname = factory
                .shell_for(&connection)
                .execute(PROBE_COMMAND)
                .context("password authentication")?;
            reporter.success(&format!("Connected to {}", hostname.trim()));
            Ok(connection)
        }
        Err(err) => Err(err.into()),
    }
}
