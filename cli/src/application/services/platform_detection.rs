//! Remote operating-system detection for bootstrap template selection.

use anyhow::Result;

use crate::application::ports::{RemoteShell, ScriptOutput};
use crate::domain::platform::{
    DETECT_PLATFORM_SCRIPT, Platform, bootstrap_distro, distro_family, parse_detection,
};

/// Detected platform plus the bootstrap template chosen for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedDistro {
    pub platform: Platform,
    /// Template name such as `chef11/debian`.
    pub distro: String,
}

/// Fingerprints the host behind `shell` and picks the bootstrap template
/// for `server_version`.
///
/// # Errors
///
/// Connection-level SSH errors, [`crate::domain::PlatformError::Undetectable`]
/// when the script fails or prints nothing, and
/// [`crate::domain::PlatformError::Unsupported`] for unknown platforms.
pub fn detect_distro(shell: &impl RemoteShell, server_version: &str) -> Result<DetectedDistro> {
    let ScriptOutput {
        output,
        exit_status,
    } = shell.run_script(DETECT_PLATFORM_SCRIPT.as_bytes())?;
    tracing::debug!(?exit_status, output = %output.trim(), "platform detection finished");

    let platform = parse_detection(&output, exit_status)?;
    let family = distro_family(&platform.name)?;
    Ok(DetectedDistro {
        distro: bootstrap_distro(server_version, family),
        platform,
    })
}
