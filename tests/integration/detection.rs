#[path = "common/mod.rs"]
mod common;

use common::Sandbox;
use svcwrap::{BackendKind, Daemon, DaemonError, ServiceConfigBuilder, ServiceStatus};

#[test]
fn daemon_binds_the_detected_backend() {
    for (init, supervisord, expected, artifact) in [
        ("systemd", false, BackendKind::Systemd, "etc/systemd/system/worker.service"),
        ("systemd", true, BackendKind::Systemd, "etc/systemd/system/worker.service"),
        ("init", true, BackendKind::Supervisor, "etc/supervisor/conf.d/worker.ini"),
        ("init", false, BackendKind::Sysv, "etc/init.d/worker"),
    ] {
        let sandbox = Sandbox::new();
        sandbox.fake.set_init(init);
        sandbox.fake.set_supervisord(supervisord);

        let daemon = Daemon::with_host(sandbox.builder(), sandbox.host()).unwrap();
        assert_eq!(daemon.kind(), expected);
        assert_eq!(daemon.artifact_path(), sandbox.root().join(artifact));
    }
}

#[test]
fn systemd_hosts_skip_the_supervisor_probe() {
    let sandbox = Sandbox::new();
    Daemon::with_host(sandbox.builder(), sandbox.host()).unwrap();
    assert!(sandbox.fake.calls_starting_with("which").is_empty());
}

#[test]
fn unknown_init_is_unsupported() {
    let sandbox = Sandbox::new();
    sandbox.fake.set_init("bash");
    let err = Daemon::with_host(sandbox.builder(), sandbox.host()).expect_err("no init marker");
    assert!(matches!(err, DaemonError::UnsupportedSystem));
}

#[test]
fn configuration_errors_surface_before_detection() {
    let sandbox = Sandbox::new();
    let err = Daemon::with_host(ServiceConfigBuilder::nil(), sandbox.host()).expect_err("nil");
    assert!(matches!(err, DaemonError::ConfigIsNil));
    let err = Daemon::with_host(ServiceConfigBuilder::empty(), sandbox.host())
        .expect_err("no exec");
    assert!(matches!(err, DaemonError::MissingExecValue));
    assert!(sandbox.fake.calls().is_empty());
}

#[test]
fn facade_drives_the_full_lifecycle() {
    let sandbox = Sandbox::new();
    sandbox.fake.set_init("init");
    sandbox.fake.set_supervisord(true);
    let mut daemon = Daemon::with_host(sandbox.builder(), sandbox.host()).unwrap();

    daemon.install().unwrap();
    daemon.enable().unwrap();
    daemon.start().unwrap();
    assert!(daemon.status().unwrap().is_active());
    daemon.stop().unwrap();
    assert_eq!(daemon.status().unwrap(), ServiceStatus::Stopped);
    daemon.disable().unwrap();
    daemon.remove().unwrap();
    assert!(!daemon.artifact_path().exists());
}
