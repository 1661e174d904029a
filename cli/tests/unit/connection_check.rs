//! Unit tests for the SSH access check with password fallback.

#![allow(clippy::expect_used)]

use std::cell::RefCell;

use anyhow::Result;
use knife_server::application::ports::SecretPrompt;
use knife_server::application::services::connection_check::{PROBE_COMMAND, verify_connection};
use knife_server::domain::SshError;
use knife_server::infra::ssh::SshShellFactory;

use crate::helpers::{FakeTransport, RecordingReporter, auth_failure, connection_as, ok};

#[derive(Default)]
struct CannedPrompt {
    asked: RefCell<Vec<String>>,
}

impl SecretPrompt for CannedPrompt {
    fn ask_password(&self, prompt: &str) -> Result<String> {
        self.asked.borrow_mut().push(prompt.to_string());
        Ok("s3cret".to_string())
    }
}

/// Accepts only the password `s3cret`.
fn password_only_transport() -> FakeTransport {
    FakeTransport::new(|conn, _| match conn.password.as_deref() {
        Some("s3cret") => ok("chef.example.com\n"),
        _ => Err(auth_failure(conn)),
    })
}

#[test]
fn test_verify_connection_succeeds_without_prompt() {
    let transport = FakeTransport::replying("chef.example.com\n", Some(0));
    let prompt = CannedPrompt::default();
    let reporter = RecordingReporter::default();

    let connection = verify_connection(
        &SshShellFactory::new(&transport),
        connection_as("root"),
        &prompt,
        &reporter,
    )
    .expect("connects");

    assert!(connection.password.is_none());
    assert!(prompt.asked.borrow().is_empty());
    assert_eq!(transport.commands(), vec![PROBE_COMMAND]);
    assert!(
        reporter
            .messages()
            .contains(&"success: Connected to chef.example.com".to_string())
    );
}

#[test]
fn test_verify_connection_falls_back_to_password_once() {
    let transport = password_only_transport();
    let prompt = CannedPrompt::default();
    let reporter = RecordingReporter::default();

    let connection = verify_connection(
        &SshShellFactory::new(&transport),
        connection_as("jdoe"),
        &prompt,
        &reporter,
    )
    .expect("password works");

    assert_eq!(connection.password.as_deref(), Some("s3cret"));
    assert_eq!(
        *prompt.asked.borrow(),
        vec!["Enter password for jdoe@chef.example.com".to_string()]
    );
    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].password.is_none());
    assert_eq!(sent[1].password.as_deref(), Some("s3cret"));
    assert!(
        reporter
            .messages()
            .contains(&"warn: Failed to authenticate jdoe - trying password auth".to_string())
    );
}

#[test]
fn test_verify_connection_gives_up_after_second_auth_failure() {
    let transport = FakeTransport::new(|conn, _| Err(auth_failure(conn)));
    let prompt = CannedPrompt::default();
    let reporter = RecordingReporter::default();

    let err = verify_connection(
        &SshShellFactory::new(&transport),
        connection_as("jdoe"),
        &prompt,
        &reporter,
    )
    .expect_err("still rejected");

    assert_eq!(transport.sent().len(), 2);
    assert_eq!(prompt.asked.borrow().len(), 1);
    let ssh = err.downcast_ref::<SshError>().expect("ssh error kept");
    assert!(ssh.is_authentication_failure());
}

#[test]
fn test_verify_connection_does_not_prompt_on_connect_error() {
    let transport = FakeTransport::new(|conn, _| {
        Err(SshError::Connect {
            host: conn.host.clone(),
            port: conn.port,
            reason: "connection refused".to_string(),
        })
    });
    let prompt = CannedPrompt::default();
    let reporter = RecordingReporter::default();

    let err = verify_connection(
        &SshShellFactory::new(&transport),
        connection_as("root"),
        &prompt,
        &reporter,
    )
    .expect_err("unreachable");

    assert!(prompt.asked.borrow().is_empty());
    assert!(err.to_string().contains("connection refused"));
}
