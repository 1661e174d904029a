//! SSH transport — implements the `RemoteShell` port on top of libssh2.
//!
//! [`SshExecutor`] owns the command policy (elevation, exit-status checks)
//! and delegates the wire work to a [`Transport`]. [`Libssh2Transport`] is
//! the production transport: one TCP connection, one session and one channel
//! per call, all torn down before returning.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use ssh2::{CheckResult, KnownHostFileKind, KnownHosts, PtyModeOpcode, PtyModes, Session};

use crate::application::ports::{RemoteShell, RemoteShellFactory, ScriptOutput};
use crate::domain::{Connection, SshError, elevate, stdin_script_wrapper};

/// Extended-data stream id for stderr (RFC 4254 §5.2).
const STDERR_STREAM: i32 = 1;

/// Pause between polls when neither stream has data.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

const READ_CHUNK: usize = 8192;

// ── Transport seam ───────────────────────────────────────────────────────────

/// A single exec request on a fresh channel.
#[derive(Debug, Clone, Copy)]
pub struct ChannelRequest<'a> {
    /// Exact command line sent to the server.
    pub command: &'a str,
    /// Bytes written to the remote stdin, followed by EOF.
    pub stdin: Option<&'a [u8]>,
    /// Request a pseudo-terminal before exec.
    pub pty: bool,
}

/// What came back from a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelOutcome {
    /// Stdout and stderr interleaved in arrival order.
    pub output: Vec<u8>,
    /// `None` when the process ended without a status (e.g. killed by a signal).
    pub exit_status: Option<i32>,
}

/// Runs one request against one host and closes everything afterwards.
pub trait Transport {
    /// # Errors
    ///
    /// Any connection-level [`SshError`]. Never [`SshError::CommandFailed`].
    fn run(
        &self,
        connection: &Connection,
        request: &ChannelRequest<'_>,
    ) -> Result<ChannelOutcome, SshError>;
}

// ── Executor ─────────────────────────────────────────────────────────────────

/// Remote executor bound to one [`Connection`].
#[derive(Debug, Clone)]
pub struct SshExecutor<T = Libssh2Transport> {
    connection: Connection,
    transport: T,
}

impl<T: Transport> SshExecutor<T> {
    #[must_use]
    pub fn new(connection: Connection, transport: T) -> Self {
        Self {
            connection,
            transport,
        }
    }

    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl<T: Transport> RemoteShell for SshExecutor<T> {
    fn execute(&self, command: &str) -> Result<String, SshError> {
        let full_command = elevate(&self.connection.user, command);
        tracing::debug!(
            remote = %self.connection.display_target(),
            elevated = !self.connection.is_root(),
            "executing remote command"
        );
        let outcome = self.transport.run(
            &self.connection,
            &ChannelRequest {
                command: &full_command,
                stdin: None,
                pty: true,
            },
        )?;
        match outcome.exit_status {
            Some(0) => Ok(String::from_utf8_lossy(&outcome.output).into_owned()),
            exit_code => {
                tracing::debug!(?exit_code, "remote command failed");
                Err(SshError::CommandFailed {
                    exit_code,
                    command: full_command,
                })
            }
        }
    }

    fn run_script(&self, script: &[u8]) -> Result<ScriptOutput, SshError> {
        let wrapper = stdin_script_wrapper(&self.connection.user);
        tracing::debug!(
            remote = %self.connection.display_target(),
            bytes = script.len(),
            "piping script to remote shell"
        );
        let outcome = self.transport.run(
            &self.connection,
            &ChannelRequest {
                command: &wrapper,
                stdin: Some(script),
                pty: false,
            },
        )?;
        Ok(ScriptOutput {
            output: String::from_utf8_lossy(&outcome.output).into_owned(),
            exit_status: outcome.exit_status,
        })
    }
}

/// Hands out executors that share one transport configuration.
#[derive(Debug, Clone, Default)]
pub struct SshShellFactory<T = Libssh2Transport> {
    transport: T,
}

impl<T: Transport + Clone> SshShellFactory<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: Transport + Clone> RemoteShellFactory for SshShellFactory<T> {
    type Shell = SshExecutor<T>;

    fn shell_for(&self, connection: &Connection) -> Self::Shell {
        SshExecutor::new(connection.clone(), self.transport.clone())
    }
}

// ── libssh2 transport ────────────────────────────────────────────────────────

/// Blocking libssh2 transport.
#[derive(Debug, Clone, Default)]
pub struct Libssh2Transport {
    timeout: Option<Duration>,
}

impl Libssh2Transport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds connect, handshake and every channel operation.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn connect(&self, connection: &Connection) -> Result<Session, SshError> {
        let host = &connection.host;
        let connect_error = |reason: String| SshError::Connect {
            host: host.clone(),
            port: connection.port,
            reason,
        };
        let addr: SocketAddr = (host.as_str(), connection.port)
            .to_socket_addrs()
            .map_err(|e| connect_error(e.to_string()))?
            .next()
            .ok_or_else(|| connect_error("host did not resolve".to_string()))?;
        let tcp = match self.timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        }
        .map_err(|e| connect_error(e.to_string()))?;

        let handshake_error = |reason: String| SshError::Handshake {
            host: host.clone(),
            reason,
        };
        let mut session = Session::new().map_err(|e| handshake_error(e.to_string()))?;
        if let Some(timeout) = self.timeout {
            session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        }
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| handshake_error(e.to_string()))?;
        tracing::debug!(%host, port = connection.port, "ssh handshake complete");

        if connection.verify_host_key {
            verify_host_key(&session, connection)?;
        }
        authenticate(&session, connection)?;
        Ok(session)
    }
}

impl Transport for Libssh2Transport {
    /// Runs one request on a fresh session.
    ///
    /// libssh2 reports `0` when the server closes the channel without an
    /// `exit-status` request, so a missing status is indistinguishable from
    /// success here. Only a process killed by a signal yields `None`.
    fn run(
        &self,
        connection: &Connection,
        request: &ChannelRequest<'_>,
    ) -> Result<ChannelOutcome, SshError> {
        let host = connection.host.as_str();
        let session = self.connect(connection)?;
        let mut channel = session.channel_session().map_err(|e| SshError::ChannelOpen {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

        if request.pty {
            let mut modes = PtyModes::new();
            modes.set_boolean(PtyModeOpcode::ECHO, false);
            modes.set_boolean(PtyModeOpcode::ONLCR, false);
            channel
                .request_pty("xterm", Some(modes), None)
                .map_err(|e| channel_error(host, &e))?;
        }
        channel
            .exec(request.command)
            .map_err(|e| channel_error(host, &e))?;

        if let Some(input) = request.stdin {
            channel
                .write_all(input)
                .and_then(|()| channel.flush())
                .map_err(|e| channel_error(host, &e))?;
            channel.send_eof().map_err(|e| channel_error(host, &e))?;
        }

        session.set_blocking(false);
        let pumped = pump(&mut channel, self.timeout, host);
        session.set_blocking(true);
        let output = pumped?;
        channel.wait_close().map_err(|e| channel_error(host, &e))?;

        let signalled = channel
            .exit_signal()
            .ok()
            .and_then(|signal| signal.exit_signal)
            .is_some();
        let exit_status = exit_status_of(signalled, channel.exit_status().ok());
        tracing::debug!(%host, ?exit_status, bytes = output.len(), "channel closed");

        Ok(ChannelOutcome {
            output,
            exit_status,
        })
    }
}

fn channel_error(host: &str, err: &dyn std::fmt::Display) -> SshError {
    SshError::Channel {
        host: host.to_string(),
        reason: err.to_string(),
    }
}

// ── Output pump ──────────────────────────────────────────────────────────────

/// The two output streams of an exec channel.
trait ChannelStreams {
    /// Non-blocking read from `stream_id`; `WouldBlock` means no data yet.
    fn read_stream(&mut self, stream_id: i32, buf: &mut [u8]) -> std::io::Result<usize>;
    fn at_eof(&self) -> bool;
}

impl ChannelStreams for ssh2::Channel {
    fn read_stream(&mut self, stream_id: i32, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream(stream_id).read(buf)
    }

    fn at_eof(&self) -> bool {
        self.eof()
    }
}

/// Drains stdout and stderr into one buffer in arrival order until EOF.
fn pump(
    streams: &mut impl ChannelStreams,
    timeout: Option<Duration>,
    host: &str,
) -> Result<Vec<u8>, SshError> {
    let mut output = Vec::new();
    let mut buf = [0u8; READ_CHUNK];
    let started = Instant::now();
    loop {
        let mut progressed = false;
        for stream_id in [0, STDERR_STREAM] {
            match streams.read_stream(stream_id, &mut buf) {
                Ok(0) => {}
                Ok(n) => {
                    output.extend_from_slice(&buf[..n]);
                    progressed = true;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => return Err(channel_error(host, &e)),
            }
        }
        if progressed {
            continue;
        }
        if streams.at_eof() {
            return Ok(output);
        }
        if let Some(timeout) = timeout
            && started.elapsed() > timeout
        {
            return Err(SshError::Channel {
                host: host.to_string(),
                reason: format!("timed out after {}s", timeout.as_secs()),
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// A process killed by a signal has no exit status.
fn exit_status_of(signalled: bool, status: Option<i32>) -> Option<i32> {
    if signalled { None } else { status }
}

// ── Host keys ────────────────────────────────────────────────────────────────

/// What to do with the key a server presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostKeyAction {
    Accept,
    /// First contact: record the key, then accept.
    Record,
}

fn host_key_action(result: CheckResult, host: &str) -> Result<HostKeyAction, SshError> {
    match result {
        CheckResult::Match => Ok(HostKeyAction::Accept),
        CheckResult::NotFound => Ok(HostKeyAction::Record),
        CheckResult::Mismatch => Err(SshError::HostKeyMismatch {
            host: host.to_string(),
        }),
        CheckResult::Failure => Err(SshError::HostKeyUnknown {
            host: host.to_string(),
        }),
    }
}

/// Host pattern as OpenSSH writes it in known_hosts.
fn known_hosts_entry(host: &str, port: u16) -> String {
    if port == 22 {
        host.to_string()
    } else {
        format!("[{host}]:{port}")
    }
}

fn known_hosts_path(connection: &Connection) -> Option<PathBuf> {
    connection
        .known_hosts
        .clone()
        .or_else(|| dirs::home_dir().map(|h| h.join(".ssh").join("known_hosts")))
}

fn verify_host_key(session: &Session, connection: &Connection) -> Result<(), SshError> {
    let host = &connection.host;
    let unknown = || SshError::HostKeyUnknown { host: host.clone() };
    let (key, key_type) = session.host_key().ok_or_else(unknown)?;
    let mut known_hosts = session.known_hosts().map_err(|e| SshError::Handshake {
        host: host.clone(),
        reason: e.to_string(),
    })?;
    let path = known_hosts_path(connection).ok_or_else(unknown)?;
    if path.exists() {
        known_hosts
            .read_file(&path, KnownHostFileKind::OpenSSH)
            .map_err(|e| SshError::Handshake {
                host: host.clone(),
                reason: format!("cannot read {}: {e}", path.display()),
            })?;
    }
    match host_key_action(known_hosts.check_port(host, connection.port, key), host)? {
        HostKeyAction::Accept => Ok(()),
        HostKeyAction::Record => {
            let entry = known_hosts_entry(host, connection.port);
            known_hosts
                .add(&entry, key, &entry, key_type.into())
                .map_err(|e| SshError::Handshake {
                    host: host.clone(),
                    reason: e.to_string(),
                })?;
            record_known_hosts(&known_hosts, &path).map_err(|reason| SshError::Handshake {
                host: host.clone(),
                reason,
            })?;
            tracing::warn!(%entry, path = %path.display(), "permanently added host key");
            Ok(())
        }
    }
}

fn record_known_hosts(known_hosts: &KnownHosts, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create {}: {e}", parent.display()))?;
    }
    known_hosts
        .write_file(path, KnownHostFileKind::OpenSSH)
        .map_err(|e| format!("cannot write {}: {e}", path.display()))
}

/// Offers the password, then each key file, then the agent.
fn authenticate(session: &Session, connection: &Connection) -> Result<(), SshError> {
    let user = connection.user.as_str();

    if let Some(password) = &connection.password {
        match session.userauth_password(user, password) {
            Ok(()) if session.authenticated() => return Ok(()),
            Ok(()) => {}
            Err(e) => tracing::debug!(error = %e, "password auth rejected"),
        }
    }

    for key in &connection.keys {
        match session.userauth_pubkey_file(user, None, key, None) {
            Ok(()) if session.authenticated() => return Ok(()),
            Ok(()) => {}
            Err(e) => tracing::debug!(key = %key.display(), error = %e, "key auth rejected"),
        }
    }

    match session.userauth_agent(user) {
        Ok(()) if session.authenticated() => return Ok(()),
        Ok(()) => {}
        Err(e) => tracing::debug!(error = %e, "agent auth rejected"),
    }

    Err(SshError::AuthenticationFailed {
        user: user.to_string(),
        host: connection.host.clone(),
    })
}
