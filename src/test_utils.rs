//! A simulated host for exercising the backends without touching the real
//! init system.
use std::{
    collections::HashSet,
    io,
    sync::{Mutex, MutexGuard},
};

use crate::process::{CommandOutput, CommandRunner, StreamOutcome, command_line};

/// PID reported for every running service.
pub const FAKE_PID: u32 = 4242;

#[derive(Debug)]
struct FakeState {
    init: String,
    supervisord: bool,
    gid: u32,
    running: HashSet<String>,
    starting: HashSet<String>,
    failures: Vec<String>,
    missing: Vec<String>,
    stream_outcome: StreamOutcome,
    calls: Vec<String>,
}

/// In-memory stand-in for the host's control binaries.
///
/// Answers `ps`, `id`, `which`, `systemctl`, `service`, `chkconfig`, `chown`,
/// `supervisorctl`, `journalctl` and `tail` the way a real host would, tracks
/// which services are running, and records every invocation. Defaults to a
/// systemd host where the caller is root and supervisord is absent.
#[derive(Debug)]
pub struct FakeRunner {
    state: Mutex<FakeState>,
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                init: "systemd".into(),
                supervisord: false,
                gid: 0,
                running: HashSet::new(),
                starting: HashSet::new(),
                failures: Vec::new(),
                missing: Vec::new(),
                stream_outcome: StreamOutcome::Exited(Some(0)),
                calls: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Command name `ps -p1` reports for process 1.
    pub fn set_init(&self, init: &str) {
        self.state().init = init.to_string();
    }

    /// Whether `which supervisord` succeeds.
    pub fn set_supervisord(&self, available: bool) {
        self.state().supervisord = available;
    }

    /// Group id printed by `id -g`.
    pub fn set_gid(&self, gid: u32) {
        self.state().gid = gid;
    }

    /// Makes every command line starting with `prefix` fail with status 1.
    pub fn fail_on(&self, prefix: &str) {
        self.state().failures.push(prefix.to_string());
    }

    /// Makes every command line starting with `prefix` fail to launch, as if
    /// the binary were missing.
    pub fn fail_spawn_on(&self, prefix: &str) {
        self.state().missing.push(prefix.to_string());
    }

    /// Clears scripted failures.
    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failures.clear();
        state.missing.clear();
    }

    /// How every later streamed command ends.
    pub fn set_stream_outcome(&self, outcome: StreamOutcome) {
        self.state().stream_outcome = outcome;
    }

    /// Marks a service as starting up: the init system knows about it but it
    /// is not running yet.
    pub fn set_starting(&self, name: &str, starting: bool) {
        let mut state = self.state();
        if starting {
            state.starting.insert(name.to_string());
        } else {
            state.starting.remove(name);
        }
    }

    /// Marks a service as running or stopped.
    pub fn set_running(&self, name: &str, running: bool) {
        let mut state = self.state();
        if running {
            state.running.insert(name.to_string());
        } else {
            state.running.remove(name);
        }
    }

    /// Whether the simulated init system considers `name` running.
    pub fn is_running(&self, name: &str) -> bool {
        self.state().running.contains(name)
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Command lines starting with `prefix`.
    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    /// Forgets recorded invocations.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput {
        success: true,
        code: Some(0),
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

fn exit(code: i32, stdout: impl Into<String>) -> CommandOutput {
    CommandOutput {
        success: false,
        code: Some(code),
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

fn unit_name(unit: &str) -> &str {
    unit.strip_suffix(".service").unwrap_or(unit)
}

impl FakeState {
    fn record(&mut self, line: &str) -> bool {
        self.calls.push(line.to_string());
        self.failures.iter().any(|prefix| line.starts_with(prefix.as_str()))
    }

    fn is_missing(&self, line: &str) -> bool {
        self.missing.iter().any(|prefix| line.starts_with(prefix.as_str()))
    }

    fn respond(&mut self, program: &str, args: &[&str]) -> CommandOutput {
        match (program, args) {
            ("ps", ["-p1"]) => ok(format!(
                "    PID TTY          TIME CMD\n      1 ?        00:00:03 {}\n",
                self.init
            )),
            ("id", ["-g"]) => ok(format!("{}\n", self.gid)),
            ("which", ["supervisord"]) if self.supervisord => ok("/usr/bin/supervisord\n"),
            ("which", _) => exit(1, ""),

            ("systemctl", ["is-active", unit]) => {
                let name = unit_name(unit);
                if self.running.contains(name) {
                    ok("active\n")
                } else if self.starting.contains(name) {
                    exit(3, "activating\n")
                } else {
                    exit(3, "inactive\n")
                }
            }
            ("systemctl", ["status", unit]) => {
                let name = unit_name(unit);
                if self.running.contains(name) {
                    ok(format!(
                        "● {name}.service - managed by svcwrap\n     Loaded: loaded (/etc/systemd/system/{name}.service; enabled)\n     Active: active (running) since Mon 2026-10-19 07:05:00 UTC; 5s ago\n   Main PID: {FAKE_PID} ({name})\n"
                    ))
                } else if self.starting.contains(name) {
                    exit(
                        3,
                        format!(
                            "● {name}.service - managed by svcwrap\n     Active: activating (auto-restart) (Result: exit-code) since Mon 2026-10-19 07:05:00 UTC; 2s ago\n"
                        ),
                    )
                } else {
                    exit(
                        3,
                        format!(
                            "○ {name}.service - managed by svcwrap\n     Active: inactive (dead)\n"
                        ),
                    )
                }
            }
            ("systemctl", ["start", unit]) => {
                self.running.insert(unit_name(unit).to_string());
                ok("")
            }
            ("systemctl", ["stop", unit]) => {
                self.running.remove(unit_name(unit));
                ok("")
            }

            ("service", [name, "status"]) => {
                if self.running.contains(*name) {
                    ok(format!("{name} (pid  {FAKE_PID}) is running...\n"))
                } else {
                    exit(3, format!("{name} is stopped\n"))
                }
            }
            ("service", [name, "start"]) => {
                self.running.insert(name.to_string());
                ok(format!("Starting {name}:\t[  OK  ]\n"))
            }
            ("service", [name, "stop"]) => {
                self.running.remove(*name);
                ok(format!("Stopping {name}: [  OK  ]\n"))
            }

            ("supervisorctl", ["status", name]) => {
                if self.running.contains(*name) {
                    ok(format!(
                        "{name:<32} RUNNING   pid {FAKE_PID}, uptime 0:00:05\n"
                    ))
                } else if self.starting.contains(*name) {
                    exit(3, format!("{name:<32} STARTING  \n"))
                } else {
                    exit(3, format!("{name:<32} STOPPED   Not started\n"))
                }
            }
            ("supervisorctl", ["start", name]) => {
                self.running.insert(name.to_string());
                ok(format!("{name}: started\n"))
            }
            ("supervisorctl", ["stop", name]) => {
                self.running.remove(*name);
                ok(format!("{name}: stopped\n"))
            }

            _ => ok(""),
        }
    }
}

impl CommandRunner for FakeRunner {
    fn output(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let line = command_line(program, args);
        let mut state = self.state();
        let failing = state.record(&line);
        if state.is_missing(&line) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("simulated missing binary: {line}"),
            ));
        }
        if failing {
            return Ok(CommandOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: format!("simulated failure: {line}"),
            });
        }
        Ok(state.respond(program, args))
    }

    fn stream(&self, program: &str, args: &[&str]) -> io::Result<StreamOutcome> {
        let line = command_line(program, args);
        let mut state = self.state();
        if state.record(&line) || state.is_missing(&line) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("simulated failure: {line}"),
            ));
        }
        Ok(state.stream_outcome)
    }
}
