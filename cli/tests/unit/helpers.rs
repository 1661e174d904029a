//! Shared test helpers: a scripted SSH transport and a recording reporter.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use knife_server::application::ports::ProgressReporter;
use knife_server::domain::{Connection, SshError};
use knife_server::infra::ssh::{ChannelOutcome, ChannelRequest, Transport};

// ── Channel outcome constructors ─────────────────────────────────────────────

pub fn ok(output: &str) -> Result<ChannelOutcome, SshError> {
    exited(output, Some(0))
}

pub fn exited(output: &str, exit_status: Option<i32>) -> Result<ChannelOutcome, SshError> {
    Ok(ChannelOutcome {
        output: output.as_bytes().to_vec(),
        exit_status,
    })
}

pub fn auth_failure(connection: &Connection) -> SshError {
    SshError::AuthenticationFailed {
        user: connection.user.clone(),
        host: connection.host.clone(),
    }
}

// ── Connections ──────────────────────────────────────────────────────────────

pub const HOST: &str = "chef.example.com";

pub fn connection_as(user: &str) -> Connection {
    Connection::new(HOST)
        .expect("valid host")
        .with_user(Some(user.to_string()))
}

// ── Fake transport ───────────────────────────────────────────────────────────

/// One request as the server would have seen it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    pub user: String,
    pub password: Option<String>,
    pub command: String,
    pub stdin: Option<Vec<u8>>,
    pub pty: bool,
}

type Responder = Box<dyn Fn(&Connection, &str) -> Result<ChannelOutcome, SshError>>;

/// Transport that answers from a closure and records every request.
pub struct FakeTransport {
    responder: Responder,
    sent: RefCell<Vec<SentRequest>>,
}

impl FakeTransport {
    pub fn new(
        responder: impl Fn(&Connection, &str) -> Result<ChannelOutcome, SshError> + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            sent: RefCell::new(Vec::new()),
        }
    }

    /// Answers every command the same way.
    pub fn replying(output: &'static str, exit_status: Option<i32>) -> Self {
        Self::new(move |_, _| exited(output, exit_status))
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.borrow().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|r| r.command.clone()).collect()
    }
}

impl Transport for FakeTransport {
    fn run(
        &self,
        connection: &Connection,
        request: &ChannelRequest<'_>,
    ) -> Result<ChannelOutcome, SshError> {
        self.sent.borrow_mut().push(SentRequest {
            user: connection.user.clone(),
            password: connection.password.clone(),
            command: request.command.to_string(),
            stdin: request.stdin.map(<[u8]>::to_vec),
            pty: request.pty,
        });
        (self.responder)(connection, request.command)
    }
}

impl Transport for &FakeTransport {
    fn run(
        &self,
        connection: &Connection,
        request: &ChannelRequest<'_>,
    ) -> Result<ChannelOutcome, SshError> {
        (**self).run(connection, request)
    }
}

// ── Recording reporter ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    messages: RefCell<Vec<String>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.messages.borrow_mut().push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.messages.borrow_mut().push(format!("success: {message}"));
    }

    fn warn(&self, message: &str) {
        self.messages.borrow_mut().push(format!("warn: {message}"));
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).expect("fixture readable")
}

/// Number of entries in `dir`.
pub fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).expect("dir readable").count()
}
