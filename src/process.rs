//! External command execution.
//!
//! Every interaction with the host's service-control binaries goes through a
//! [`CommandRunner`], which keeps the backends testable against a simulated
//! host. [`SystemRunner`] is the real implementation.
use std::{
    fmt, io,
    process::{Child, Command, Stdio},
    sync::{
        OnceLock,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Instant,
};

use nix::{
    sys::signal::{self, Signal},
    unistd::Pid,
};
use tracing::{debug, warn};

use crate::constants::{
    INTERRUPTED_EXIT_CODE, STREAM_POLL_INTERVAL, STREAM_TERMINATE_GRACE,
};

/// Captured result of a command that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited with status zero.
    pub success: bool,
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// How a streamed command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The command finished on its own.
    Exited(Option<i32>),
    /// An interrupt or termination signal cancelled the command.
    Interrupted,
}

/// Runs external programs on behalf of the backends.
pub trait CommandRunner: Send + Sync + fmt::Debug {
    /// Runs `program` to completion, capturing its output.
    fn output(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;

    /// Runs `program` with stdout/stderr passed through to the caller until it
    /// exits or the user interrupts it.
    fn stream(&self, program: &str, args: &[&str]) -> io::Result<StreamOutcome>;
}

/// Renders a command line for logs and error messages.
pub fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

/// Runs commands on the real host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn stream(&self, program: &str, args: &[&str]) -> io::Result<StreamOutcome> {
        let hook = match interrupt_hook() {
            Ok(hook) => Some(hook),
            Err(err) => {
                warn!("Interrupt hook unavailable, streaming without cancellation: {err}");
                None
            }
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        let Some(hook) = hook else {
            let status = child.wait()?;
            return Ok(StreamOutcome::Exited(status.code()));
        };

        let _active = hook.activate();
        loop {
            if let Some(status) = child.try_wait()? {
                // The terminal delivers Ctrl-C to the child too; it may exit first.
                if hook.interrupted.swap(false, Ordering::SeqCst) {
                    return Ok(StreamOutcome::Interrupted);
                }
                return Ok(StreamOutcome::Exited(status.code()));
            }
            if hook.interrupted.swap(false, Ordering::SeqCst) {
                debug!("Interrupt received, cancelling '{program}'");
                terminate(&mut child)?;
                return Ok(StreamOutcome::Interrupted);
            }
            thread::sleep(STREAM_POLL_INTERVAL);
        }
    }
}

/// Process-wide signal state shared with the `ctrlc` handler.
struct InterruptHook {
    streaming: AtomicBool,
    interrupted: AtomicBool,
}

static HOOK: InterruptHook = InterruptHook {
    streaming: AtomicBool::new(false),
    interrupted: AtomicBool::new(false),
};

static HOOK_INSTALLED: OnceLock<Result<(), String>> = OnceLock::new();

/// Installs the signal handler on first use.
///
/// Outside of a stream the handler exits with the conventional interrupt
/// status, so installing it does not change how the process reacts to Ctrl-C.
fn interrupt_hook() -> io::Result<&'static InterruptHook> {
    HOOK_INSTALLED
        .get_or_init(|| {
            ctrlc::set_handler(|| {
                if HOOK.streaming.load(Ordering::SeqCst) {
                    HOOK.interrupted.store(true, Ordering::SeqCst);
                } else {
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            })
            .map_err(|err| err.to_string())
        })
        .clone()
        .map_err(io::Error::other)?;
    Ok(&HOOK)
}

impl InterruptHook {
    fn activate(&'static self) -> ActiveStream {
        self.interrupted.store(false, Ordering::SeqCst);
        self.streaming.store(true, Ordering::SeqCst);
        ActiveStream(self)
    }
}

/// Marks the hook idle again when the stream ends, however it ends.
struct ActiveStream(&'static InterruptHook);

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.0.streaming.store(false, Ordering::SeqCst);
    }
}

/// Asks the child to exit, escalating to SIGKILL after the grace period.
fn terminate(child: &mut Child) -> io::Result<()> {
    let pid = Pid::from_raw(child.id() as i32);
    if let Err(err) = signal::kill(pid, Signal::SIGTERM) {
        debug!("SIGTERM to {pid} failed: {err}");
    }

    let deadline = Instant::now() + STREAM_TERMINATE_GRACE;
    while Instant::now() < deadline {
        if child.try_wait()?.is_some() {
            return Ok(());
        }
        thread::sleep(STREAM_POLL_INTERVAL);
    }

    warn!("Child {pid} ignored SIGTERM; killing");
    child.kill()?;
    child.wait()?;
    Ok(())
}
