#[path = "common/mod.rs"]
mod common;

use std::fs;

use common::Sandbox;
use svcwrap::{BackendKind, DaemonError, process::StreamOutcome};

#[test]
fn log_streams_the_native_log_command() {
    for kind in [BackendKind::Systemd, BackendKind::Sysv, BackendKind::Supervisor] {
        let sandbox = Sandbox::new();
        let mut backend = sandbox.backend(kind);
        backend.install().unwrap();
        sandbox.fake.clear_calls();

        backend.log().unwrap_or_else(|err| panic!("{kind}: {err}"));
        let expected = match kind {
            BackendKind::Systemd => "journalctl -fu worker".to_string(),
            BackendKind::Sysv => format!("tail -f {}", sandbox.log_file().display()),
            BackendKind::Supervisor => "supervisorctl tail -f worker".to_string(),
        };
        assert_eq!(sandbox.fake.calls(), vec![expected], "{kind}");
    }
}

#[test]
fn sysv_log_recreates_a_missing_log_file() {
    let sandbox = Sandbox::new();
    let mut backend = sandbox.backend(BackendKind::Sysv);
    backend.install().unwrap();
    fs::remove_dir_all(sandbox.log_file().parent().unwrap()).unwrap();

    backend.log().unwrap();
    assert!(sandbox.log_file().is_file());
}

#[test]
fn systemd_log_does_not_create_a_log_file() {
    let sandbox = Sandbox::new();
    let mut backend = sandbox.backend(BackendKind::Systemd);
    backend.install().unwrap();
    backend.log().unwrap();
    assert!(!sandbox.log_file().exists());
}

#[test]
fn log_requires_installation() {
    let sandbox = Sandbox::new();
    let backend = sandbox.backend(BackendKind::Supervisor);
    assert!(matches!(backend.log(), Err(DaemonError::NotInstalled)));
    assert!(sandbox.fake.calls().is_empty());
}

#[test]
fn failing_stream_is_reported() {
    let sandbox = Sandbox::new();
    let mut backend = sandbox.backend(BackendKind::Systemd);
    backend.install().unwrap();
    sandbox.fake.fail_on("journalctl");

    let err = backend.log().expect_err("journalctl unavailable");
    assert!(matches!(err, DaemonError::Spawn { .. }));
}

#[test]
fn failing_log_command_is_reported() {
    for kind in [BackendKind::Systemd, BackendKind::Sysv, BackendKind::Supervisor] {
        let sandbox = Sandbox::new();
        let mut backend = sandbox.backend(kind);
        backend.install().unwrap();

        sandbox.fake.set_stream_outcome(StreamOutcome::Exited(Some(1)));
        match backend.log() {
            Err(DaemonError::CommandFailed { code, .. }) => assert_eq!(code, Some(1), "{kind}"),
            other => panic!("{kind}: unexpected result {other:?}"),
        }
    }
}

#[test]
fn interrupted_log_is_a_success() {
    let sandbox = Sandbox::new();
    let mut backend = sandbox.backend(BackendKind::Supervisor);
    backend.install().unwrap();

    sandbox.fake.set_stream_outcome(StreamOutcome::Interrupted);
    backend.log().unwrap();
}
