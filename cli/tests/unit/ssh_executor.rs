//! Unit tests for `SshExecutor` over a scripted transport.

#![allow(clippy::expect_used)]

use knife_server::application::ports::{RemoteShell, RemoteShellFactory};
use knife_server::domain::connection::SUDO_PREFIX;
use knife_server::domain::{SshError, stdin_script_wrapper};
use knife_server::infra::ssh::{SshExecutor, SshShellFactory};

use crate::helpers::{FakeTransport, auth_failure, connection_as, exited, ok};

#[test]
fn test_execute_as_root_sends_command_unmodified() {
    let transport = FakeTransport::replying("wadup.example.com\n", Some(0));
    let shell = SshExecutor::new(connection_as("root"), &transport);

    let output = shell.execute("hostname -f").expect("command succeeds");

    assert_eq!(output, "wadup.example.com\n");
    assert_eq!(transport.commands(), vec!["hostname -f".to_string()]);
}

#[test]
fn test_execute_as_non_root_wraps_in_sudo_bash() {
    let transport = FakeTransport::replying("", Some(0));
    let shell = SshExecutor::new(connection_as("jdoe"), &transport);

    shell.execute("cat /etc/chef/validation.pem").expect("command succeeds");

    assert_eq!(
        transport.commands(),
        vec![
            r#"sudo USER=root HOME="$(getent passwd root | cut -d : -f 6)" bash -c 'cat /etc/chef/validation.pem'"#
                .to_string()
        ]
    );
}

#[test]
fn test_execute_requests_pty_and_sends_no_stdin() {
    let transport = FakeTransport::replying("", Some(0));
    let shell = SshExecutor::new(connection_as("root"), &transport);

    shell.execute("true").expect("command succeeds");

    let sent = transport.sent();
    assert!(sent[0].pty);
    assert!(sent[0].stdin.is_none());
}

#[test]
fn test_execute_nonzero_exit_as_jdoe_is_command_failed() {
    let transport = FakeTransport::replying("partial output", Some(1));
    let shell = SshExecutor::new(connection_as("jdoe"), &transport);

    let err = shell
        .execute("hostname -f")
        .expect_err("exit 1 must fail");

    match err {
        SshError::CommandFailed { exit_code, command } => {
            assert_eq!(exit_code, Some(1));
            assert!(command.contains("hostname -f"));
            assert!(command.starts_with(SUDO_PREFIX));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn test_execute_missing_exit_status_is_command_failed() {
    let transport = FakeTransport::replying("killed", None);
    let shell = SshExecutor::new(connection_as("root"), &transport);

    let err = shell.execute("sleep 100").expect_err("no status must fail");

    assert!(matches!(
        err,
        SshError::CommandFailed { exit_code: None, .. }
    ));
    assert!(err.to_string().contains("<none>"));
}

#[test]
fn test_execute_returns_bytes_verbatim() {
    let transport = FakeTransport::replying("abc123", Some(0));
    let shell = SshExecutor::new(connection_as("root"), &transport);

    assert_eq!(shell.execute("cat key").expect("succeeds"), "abc123");
}

#[test]
fn test_execute_propagates_authentication_failure() {
    let transport = FakeTransport::new(|conn, _| Err(auth_failure(conn)));
    let shell = SshExecutor::new(connection_as("jdoe"), &transport);

    let err = shell.execute("hostname -f").expect_err("auth fails");

    assert!(err.is_authentication_failure());
    assert!(err.is_connection_error());
}

#[test]
fn test_execute_propagates_channel_open_failure() {
    let transport = FakeTransport::new(|conn, _| {
        Err(SshError::ChannelOpen {
            host: conn.host.clone(),
            reason: "administratively prohibited".to_string(),
        })
    });
    let shell = SshExecutor::new(connection_as("root"), &transport);

    let err = shell.execute("true").expect_err("open fails");

    assert!(matches!(err, SshError::ChannelOpen { .. }));
    assert!(!err.is_authentication_failure());
}

#[test]
fn test_run_script_pipes_script_over_stdin_without_pty() {
    let transport = FakeTransport::replying("debian\n7\n", Some(0));
    let shell = SshExecutor::new(connection_as("root"), &transport);

    let result = shell.run_script(b"echo debian").expect("connection ok");

    assert_eq!(result.output, "debian\n7\n");
    assert_eq!(result.exit_status, Some(0));
    let sent = transport.sent();
    assert_eq!(sent[0].command, stdin_script_wrapper("root"));
    assert_eq!(sent[0].stdin.as_deref(), Some(b"echo debian".as_slice()));
    assert!(!sent[0].pty);
}

#[test]
fn test_run_script_elevates_non_root_wrapper() {
    let transport = FakeTransport::replying("", Some(0));
    let shell = SshExecutor::new(connection_as("jdoe"), &transport);

    shell.run_script(b"true").expect("connection ok");

    let command = &transport.sent()[0].command;
    assert!(command.starts_with(SUDO_PREFIX));
    assert!(command.contains("/dev/fd/0"));
    assert!(command.contains("/dev/stdin"));
}

#[test]
fn test_run_script_returns_failure_status_instead_of_raising() {
    let transport = FakeTransport::new(|_, _| exited("sh: 1: unknown: not found\n", Some(127)));
    let shell = SshExecutor::new(connection_as("root"), &transport);

    let result = shell.run_script(b"unknown").expect("status is returned");

    assert_eq!(result.exit_status, Some(127));
    assert!(result.output.contains("not found"));
}

#[test]
fn test_run_script_reports_missing_status_as_none() {
    let transport = FakeTransport::replying("", None);
    let shell = SshExecutor::new(connection_as("root"), &transport);

    let result = shell.run_script(b"kill -9 $$").expect("status is returned");

    assert_eq!(result.exit_status, None);
}

#[test]
fn test_run_script_propagates_connection_errors() {
    let transport = FakeTransport::new(|conn, _| Err(auth_failure(conn)));
    let shell = SshExecutor::new(connection_as("root"), &transport);

    assert!(shell.run_script(b"true").is_err());
}

#[test]
fn test_each_call_is_a_separate_request() {
    let transport = FakeTransport::new(|_, cmd| ok(cmd));
    let shell = SshExecutor::new(connection_as("root"), &transport);

    shell.execute("one").expect("ok");
    shell.execute("two").expect("ok");

    assert_eq!(transport.commands(), vec!["one", "two"]);
}

#[test]
fn test_shell_factory_binds_given_connection() {
    let transport = FakeTransport::replying("", Some(0));
    let factory = SshShellFactory::new(&transport);
    let connection = connection_as("jdoe").with_port(Some(2222));

    let shell = factory.shell_for(&connection);

    assert_eq!(shell.connection(), &connection);
    shell.execute("true").expect("ok");
    assert_eq!(transport.sent()[0].user, "jdoe");
}
