//! Unit tests for the knife-server library
//!
//! These tests use scripted transports and temp dirs and run without a
//! network.

mod architecture;
mod connection_check;
mod helpers;
mod key_derivation;
mod ssh_executor;
