//! Naming rules for key backups.
//!
//! Pure functions only — no I/O.

use std::fmt;
use std::path::{Path, PathBuf};

/// Point-in-time token embedded in a backup file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSuffix(String);

impl BackupSuffix {
    /// Current Unix timestamp, in seconds.
    #[must_use]
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BackupSuffix {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BackupSuffix {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for BackupSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sibling path that receives a copy of `path` before it is overwritten.
///
/// `/tmp/validation.pem` with suffix `old` becomes `/tmp/validation.old.pem`.
/// Only the last dot of the file name splits stem from extension; a name
/// without a dot gets the suffix appended.
#[must_use]
pub fn backup_path(path: &Path, suffix: &BackupSuffix) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let backup_name = match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}.{suffix}.{ext}"),
        None => format!("{name}.{suffix}"),
    };
    path.with_file_name(backup_name)
}
