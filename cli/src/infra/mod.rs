//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: SSH transport, filesystem
//! access, key parsing, configuration loading, and terminal prompts.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod config;
pub mod fs;
pub mod keys;
pub mod prompt;
pub mod ssh;
