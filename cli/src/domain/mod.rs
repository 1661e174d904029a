//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod backup;
pub mod config;
pub mod connection;
pub mod error;
pub mod platform;
pub mod variant;

pub use backup::{BackupSuffix, backup_path};
pub use config::KnifeServerConfig;
pub use connection::{Connection, elevate, stdin_script_wrapper};
pub use error::{ConfigError, CredentialsError, PlatformError, SshError};
pub use platform::{DistroFamily, Platform};
pub use variant::{KeySource, ServerVariant};
