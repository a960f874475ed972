#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::Arc,
};

use svcwrap::{
    BackendKind, Host, ServiceConfig, ServiceConfigBuilder, backend::Backend,
    test_utils::FakeRunner,
};
use tempfile::TempDir;

pub const SERVICE: &str = "worker";

/// A temporary filesystem root plus a simulated host answering commands.
pub struct Sandbox {
    dir: TempDir,
    pub fake: Arc<FakeRunner>,
    pub exec: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let bin = dir.path().join("opt/worker/bin");
        fs::create_dir_all(&bin).expect("failed to create bin dir");
        let exec = bin.join(SERVICE);
        fs::write(&exec, "#!/bin/sh\nsleep 60\n").expect("failed to write executable");
        fs::set_permissions(&exec, fs::Permissions::from_mode(0o755))
            .expect("failed to chmod executable");

        Self {
            dir,
            fake: Arc::new(FakeRunner::new()),
            exec,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn host(&self) -> Host {
        Host::new(self.fake.clone()).with_root(self.root())
    }

    pub fn log_file(&self) -> PathBuf {
        self.root().join("var/log/worker/worker.log")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root().join("var/lock/subsys/worker.lock")
    }

    /// Builder with every host path redirected into the sandbox.
    pub fn builder(&self) -> ServiceConfigBuilder {
        ServiceConfigBuilder::for_exec(&self.exec)
            .name(SERVICE)
            .log_file(self.log_file())
            .pid_file(self.root().join("var/run/worker.pid"))
            .lock_file(self.lock_file())
    }

    pub fn config(&self) -> ServiceConfig {
        self.builder().build().expect("sandbox config is valid")
    }

    pub fn backend(&self, kind: BackendKind) -> Backend {
        Backend::new(kind, self.config(), self.host())
    }

    /// Every file below the sandbox root except the executable, relative to it.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect(self.root(), self.root(), &mut files);
        files.retain(|path| !path.starts_with("opt"));
        files.sort();
        files
    }
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(root, &path, out);
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_path_buf());
        }
    }
}
