#[path = "common/mod.rs"]
mod common;

use std::fs;

use common::{SERVICE, Sandbox};
use strum::IntoEnumIterator;
use svcwrap::{BackendKind, DaemonError, ServiceStatus, test_utils::FAKE_PID};

#[test]
fn install_writes_artifact_and_registers() {
    for kind in BackendKind::iter() {
        let sandbox = Sandbox::new();
        let mut backend = sandbox.backend(kind);
        backend.install().unwrap_or_else(|err| panic!("{kind}: {err}"));

        let artifact = fs::read_to_string(backend.artifact_path()).unwrap();
        assert!(
            artifact.contains(&sandbox.exec.display().to_string()),
            "{kind}: artifact does not reference the executable"
        );

        let calls = sandbox.fake.calls();
        let expected: &[&str] = match kind {
            BackendKind::Systemd => &["systemctl daemon-reload", "systemctl enable worker.service"],
            BackendKind::Sysv => &["chkconfig --add worker"],
            BackendKind::Supervisor => &["supervisorctl reread", "supervisorctl add worker"],
        };
        for call in expected {
            assert!(calls.iter().any(|c| c == call), "{kind}: missing '{call}' in {calls:?}");
        }
    }
}

#[test]
fn sysv_install_prepares_logs_and_rotation() {
    let sandbox = Sandbox::new();
    let mut backend = sandbox.backend(BackendKind::Sysv);
    backend.install().unwrap();

    assert!(sandbox.log_file().is_file());
    let rotation = fs::read_to_string(sandbox.root().join("etc/logrotate.d/worker")).unwrap();
    assert!(rotation.starts_with(&sandbox.log_file().display().to_string()));

    let lock_dir = sandbox.lock_file().parent().unwrap().display().to_string();
    assert!(
        sandbox
            .fake
            .calls()
            .contains(&format!("chown -R root:root {lock_dir}"))
    );
}

#[test]
fn supervisor_install_creates_log_file() {
    let sandbox = Sandbox::new();
    let mut backend = sandbox.backend(BackendKind::Supervisor);
    backend.install().unwrap();

    assert!(sandbox.log_file().is_file());
    let block = fs::read_to_string(backend.artifact_path()).unwrap();
    assert!(block.contains("[program:worker]"));
    assert!(block.contains(&format!("stdout_logfile={}", sandbox.log_file().display())));
}

#[test]
fn install_twice_is_already_installed() {
    for kind in BackendKind::iter() {
        let sandbox = Sandbox::new();
        let mut backend = sandbox.backend(kind);
        backend.install().unwrap();
        let before = fs::read_to_string(backend.artifact_path()).unwrap();

        let mut again = sandbox.backend(kind);
        let err = again.install().expect_err("second install");
        assert!(matches!(err, DaemonError::AlreadyInstalled), "{kind}: {err:?}");
        assert_eq!(fs::read_to_string(backend.artifact_path()).unwrap(), before);
    }
}

#[test]
fn remove_without_install_touches_nothing() {
    for kind in BackendKind::iter() {
        let sandbox = Sandbox::new();
        let err = sandbox.backend(kind).remove().expect_err("nothing installed");
        assert!(matches!(err, DaemonError::NotInstalled), "{kind}: {err:?}");
        assert!(sandbox.files().is_empty(), "{kind}: {:?}", sandbox.files());
        assert_eq!(sandbox.fake.calls(), vec!["id -g".to_string()]);
    }
}

#[test]
fn operations_require_installation() {
    for kind in BackendKind::iter() {
        let sandbox = Sandbox::new();
        let backend = sandbox.backend(kind);
        for result in [backend.start(), backend.stop(), backend.log()] {
            assert!(matches!(result, Err(DaemonError::NotInstalled)), "{kind}: {result:?}");
        }
        assert!(matches!(backend.status(), Err(DaemonError::NotInstalled)));
    }
}

#[test]
fn start_stop_state_machine() {
    for kind in BackendKind::iter() {
        let sandbox = Sandbox::new();
        let mut backend = sandbox.backend(kind);
        backend.install().unwrap();
        assert_eq!(backend.status().unwrap(), ServiceStatus::Stopped, "{kind}");

        backend.start().unwrap();
        assert!(sandbox.fake.is_running(SERVICE));
        assert!(matches!(backend.start(), Err(DaemonError::AlreadyRunning)), "{kind}");
        assert_eq!(
            backend.status().unwrap(),
            ServiceStatus::Running { pid: Some(FAKE_PID) },
            "{kind}"
        );

        backend.stop().unwrap();
        assert!(!sandbox.fake.is_running(SERVICE));
        assert!(matches!(backend.stop(), Err(DaemonError::AlreadyStopped)), "{kind}");
        assert_eq!(backend.status().unwrap(), ServiceStatus::Stopped, "{kind}");
    }
}

#[test]
fn remove_stops_and_deletes_artifacts() {
    for kind in BackendKind::iter() {
        let sandbox = Sandbox::new();
        let mut backend = sandbox.backend(kind);
        backend.install().unwrap();
        backend.start().unwrap();

        backend.remove().unwrap();
        assert!(!backend.artifact_path().exists(), "{kind}");
        assert!(!sandbox.fake.is_running(SERVICE), "{kind}");
        assert!(!sandbox.root().join("etc/logrotate.d/worker").exists());

        let err = backend.remove().expect_err("already removed");
        assert!(matches!(err, DaemonError::NotInstalled), "{kind}");
    }
}

#[test]
fn remove_tolerates_failed_deregistration() {
    for (kind, failing) in [
        (BackendKind::Systemd, "systemctl disable"),
        (BackendKind::Sysv, "chkconfig --del"),
        (BackendKind::Supervisor, "supervisorctl remove"),
    ] {
        let sandbox = Sandbox::new();
        let mut backend = sandbox.backend(kind);
        backend.install().unwrap();

        sandbox.fake.fail_on(failing);
        backend.remove().unwrap_or_else(|err| panic!("{kind}: {err}"));
        assert!(!backend.artifact_path().exists(), "{kind}");
    }
}

#[test]
fn non_root_callers_are_refused() {
    for kind in BackendKind::iter() {
        let sandbox = Sandbox::new();
        sandbox.fake.set_gid(1000);
        let mut backend = sandbox.backend(kind);

        let err = backend.install().expect_err("not root");
        assert!(matches!(err, DaemonError::RootPrivileges), "{kind}: {err:?}");
        assert!(err.to_string().contains("sudo"));
        assert!(sandbox.files().is_empty(), "{kind}");

        for result in [backend.remove(), backend.start(), backend.stop()] {
            assert!(matches!(result, Err(DaemonError::RootPrivileges)), "{kind}");
        }
    }
}

#[test]
fn supervisor_status_does_not_need_root() {
    let sandbox = Sandbox::new();
    let mut backend = sandbox.backend(BackendKind::Supervisor);
    backend.install().unwrap();
    sandbox.fake.set_gid(1000);

    assert_eq!(backend.status().unwrap(), ServiceStatus::Stopped);

    let systemd = sandbox.backend(BackendKind::Systemd);
    assert!(matches!(systemd.status(), Err(DaemonError::RootPrivileges)));
}

#[test]
fn sysv_enable_and_disable_use_chkconfig() {
    let sandbox = Sandbox::new();
    let mut backend = sandbox.backend(BackendKind::Sysv);
    assert!(matches!(backend.enable(), Err(DaemonError::NotInstalled)));

    backend.install().unwrap();
    sandbox.fake.clear_calls();
    backend.disable().unwrap();
    backend.enable().unwrap();
    assert_eq!(
        sandbox.fake.calls_starting_with("chkconfig"),
        vec!["chkconfig --del worker", "chkconfig --add worker"]
    );
}

#[test]
fn enable_and_disable_are_noops_elsewhere() {
    for kind in [BackendKind::Systemd, BackendKind::Supervisor] {
        let sandbox = Sandbox::new();
        let backend = sandbox.backend(kind);
        backend.enable().unwrap();
        backend.disable().unwrap();
        assert!(sandbox.fake.calls().is_empty(), "{kind}");
    }
}

#[test]
fn starting_services_report_starting() {
    for kind in [BackendKind::Systemd, BackendKind::Supervisor] {
        let sandbox = Sandbox::new();
        let mut backend = sandbox.backend(kind);
        backend.install().unwrap();

        sandbox.fake.set_starting(SERVICE, true);
        assert_eq!(backend.status().unwrap(), ServiceStatus::Starting, "{kind}");
    }
}

#[test]
fn unlaunchable_status_query_reads_as_stopped() {
    for (kind, query) in [
        (BackendKind::Systemd, "systemctl status"),
        (BackendKind::Sysv, "service worker status"),
        (BackendKind::Supervisor, "supervisorctl status"),
    ] {
        let sandbox = Sandbox::new();
        let mut backend = sandbox.backend(kind);
        backend.install().unwrap();
        backend.start().unwrap();

        sandbox.fake.fail_spawn_on(query);
        assert_eq!(backend.status().unwrap(), ServiceStatus::Stopped, "{kind}");
    }
}

#[test]
fn remove_tolerates_failed_stop() {
    for (kind, failing) in [
        (BackendKind::Systemd, "systemctl stop"),
        (BackendKind::Sysv, "service worker stop"),
        (BackendKind::Supervisor, "supervisorctl stop"),
    ] {
        let sandbox = Sandbox::new();
        let mut backend = sandbox.backend(kind);
        backend.install().unwrap();
        backend.start().unwrap();

        sandbox.fake.fail_on(failing);
        backend.remove().unwrap_or_else(|err| panic!("{kind}: {err}"));
        assert!(!backend.artifact_path().exists(), "{kind}");
        assert!(sandbox.fake.calls().iter().any(|c| c.starts_with(failing)), "{kind}");
    }
}

#[test]
fn only_sysv_remove_fails_when_the_artifact_cannot_be_deleted() {
    for kind in BackendKind::iter() {
        let sandbox = Sandbox::new();
        let backend = sandbox.backend(kind);
        let artifact = backend.artifact_path();
        fs::create_dir_all(&artifact).unwrap();
        fs::write(artifact.join("keep"), "x").unwrap();

        let result = backend.remove();
        match kind {
            BackendKind::Sysv => {
                assert!(matches!(result, Err(DaemonError::Io { .. })), "{kind}: {result:?}")
            }
            _ => assert!(result.is_ok(), "{kind}: {result:?}"),
        }
        assert!(artifact.join("keep").exists(), "{kind}");
    }
}
