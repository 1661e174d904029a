//! Remote operating-system fingerprinting and distro selection.
//!
//! Pure functions only — the script is shipped to the host by the caller.

use crate::domain::error::PlatformError;

/// Script piped to the remote shell; prints platform and version lines.
pub const DETECT_PLATFORM_SCRIPT: &str = include_str!("../../assets/detect-platform.sh");

/// What the detection script reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub name: String,
    pub version: String,
}

/// Bootstrap template family for a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistroFamily {
    Debian,
    Rhel,
    Solaris,
    Suse,
}

impl DistroFamily {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debian => "debian",
            Self::Rhel => "rhel",
            Self::Solaris => "solaris",
            Self::Suse => "suse",
        }
    }
}

/// Interprets the detection script's combined output.
///
/// # Errors
///
/// Returns [`PlatformError::Undetectable`] when the script exited non-zero,
/// reported no exit status, or printed nothing.
pub fn parse_detection(output: &str, exit_status: Option<i32>) -> Result<Platform, PlatformError> {
    if exit_status != Some(0) {
        return Err(PlatformError::Undetectable);
    }
    let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
    let name = lines.next().ok_or(PlatformError::Undetectable)?;
    let version = lines.next().unwrap_or_default();
    Ok(Platform {
        name: name.to_string(),
        version: version.to_string(),
    })
}

/// Maps a platform name onto the bootstrap template family.
///
/// # Errors
///
/// Returns [`PlatformError::Unsupported`] for unknown platforms.
pub fn distro_family(platform: &str) -> Result<DistroFamily, PlatformError> {
    match platform {
        "debian" | "ubuntu" => Ok(DistroFamily::Debian),
        "el" | "redhat" | "centos" => Ok(DistroFamily::Rhel),
        "sles" | "suse" => Ok(DistroFamily::Suse),
        p if p.starts_with("solaris") => Ok(DistroFamily::Solaris),
        other => Err(PlatformError::Unsupported(other.to_string())),
    }
}

/// Bootstrap template name, e.g. `chef11/debian`.
#[must_use]
pub fn bootstrap_distro(server_version: &str, family: DistroFamily) -> String {
    format!("chef{server_version}/{}", family.as_str())
}
