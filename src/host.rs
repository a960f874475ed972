//! The explicit host context shared by the detector, the backends and the
//! facade.
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::debug;

use crate::{
    error::{DaemonError, Result},
    process::{CommandOutput, CommandRunner, StreamOutcome, SystemRunner, command_line},
};

/// Where commands run and where artifacts live.
///
/// Artifact directories such as `/etc/systemd/system` are resolved against
/// [`Host::root`]; paths supplied by the service configuration are used as-is.
#[derive(Debug, Clone)]
pub struct Host {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
}

impl Host {
    /// The machine this process runs on.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner))
    }

    /// A host driven by a custom runner, rooted at `/`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            root: PathBuf::from("/"),
        }
    }

    /// Re-roots artifact directories under `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Filesystem root for artifact directories.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves an absolute artifact path against the host root.
    pub fn path(&self, absolute: impl AsRef<Path>) -> PathBuf {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix("/").unwrap_or(absolute);
        self.root.join(relative)
    }

    /// Runs a command and captures its output. Only a failure to launch is an
    /// error; a non-zero exit is reported through [`CommandOutput::success`].
    pub fn output(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let command = command_line(program, args);
        debug!("Running '{command}'");
        let output = self
            .runner
            .output(program, args)
            .map_err(|source| DaemonError::Spawn {
                command: command.clone(),
                source,
            })?;
        debug!("'{command}' exited with {:?}", output.code);
        Ok(output)
    }

    /// Runs a command that must succeed.
    pub fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        let output = self.output(program, args)?;
        if output.success {
            return Ok(());
        }
        Err(DaemonError::CommandFailed {
            command: command_line(program, args),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }

    /// Streams a command's output until it ends or is interrupted.
    pub fn stream(&self, program: &str, args: &[&str]) -> Result<StreamOutcome> {
        let command = command_line(program, args);
        debug!("Streaming '{command}'");
        self.runner
            .stream(program, args)
            .map_err(|source| DaemonError::Spawn { command, source })
    }

    /// Streams a command until it ends or is interrupted. Interrupting is the
    /// normal way to stop following; a non-zero exit is a failure.
    pub fn follow(&self, program: &str, args: &[&str]) -> Result<()> {
        match self.stream(program, args)? {
            StreamOutcome::Interrupted => Ok(()),
            StreamOutcome::Exited(None | Some(0)) => Ok(()),
            StreamOutcome::Exited(code) => Err(DaemonError::CommandFailed {
                command: command_line(program, args),
                code,
                stderr: String::new(),
            }),
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::system()
    }
}
