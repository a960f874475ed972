//! Service configuration for svcwrap.
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{
    constants::{
        DEFAULT_GROUP, DEFAULT_USER, default_description, default_lock_file,
        default_log_file, default_pid_file,
    },
    error::{DaemonError, Result},
};

/// Everything a backend needs to know about the managed service.
///
/// Built once through [`ServiceConfigBuilder`] and read-only afterwards, except
/// that install rewrites [`ServiceConfig::exec`] to its resolved absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceConfig {
    /// Human-readable description.
    pub description: String,
    /// Service name; every artifact path derives from it.
    pub name: String,
    /// Executable to run.
    pub exec: PathBuf,
    /// Command-line arguments, passed through verbatim.
    pub args: String,
    /// Working directory of the service.
    pub work_dir: PathBuf,
    /// Backend-specific dependency list; empty selects the backend default.
    pub dependencies: String,
    /// Run-as user.
    pub user: String,
    /// Run-as group.
    pub group: String,
    /// Log file written by the service.
    pub log_file: PathBuf,
    /// PID file.
    pub pid_file: PathBuf,
    /// Lock file.
    pub lock_file: PathBuf,
}

/// Mutable draft the builder applies options to. Unset derived fields are
/// filled from the final name when the configuration is built.
#[derive(Debug, Clone, Default)]
struct Draft {
    description: Option<String>,
    name: Option<String>,
    exec: Option<PathBuf>,
    args: String,
    work_dir: Option<PathBuf>,
    dependencies: String,
    user: String,
    group: String,
    log_file: Option<PathBuf>,
    pid_file: Option<PathBuf>,
    lock_file: Option<PathBuf>,
}

impl Draft {
    fn for_exec(exec: PathBuf) -> Self {
        Self {
            exec: Some(exec),
            user: DEFAULT_USER.to_string(),
            group: DEFAULT_GROUP.to_string(),
            ..Self::default()
        }
    }

    /// Defaults derived from the running executable.
    fn from_current_exe() -> Option<Self> {
        let exec = env::current_exe()
            .or_else(|_| {
                let arg0 = env::args_os().next().ok_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::NotFound, "argv[0] missing")
                })?;
                std::path::absolute(arg0)
            })
            .ok()?;
        Some(Self::for_exec(exec))
    }
}

/// Applies configuration options over host-derived defaults.
///
/// Setters may be called in any order; when two calls write the same field
/// the last one wins.
#[derive(Debug, Clone)]
pub struct ServiceConfigBuilder {
    draft: Option<Draft>,
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceConfigBuilder {
    /// Starts from defaults describing the running executable itself.
    pub fn new() -> Self {
        Self {
            draft: Draft::from_current_exe(),
        }
    }

    /// Starts from defaults describing `exec` instead of the running executable.
    pub fn for_exec(exec: impl Into<PathBuf>) -> Self {
        Self {
            draft: Some(Draft::for_exec(exec.into())),
        }
    }

    /// Starts from an empty draft with no executable.
    pub fn empty() -> Self {
        Self {
            draft: Some(Draft::default()),
        }
    }

    /// A builder with no draft at all. Building it fails with
    /// [`DaemonError::ConfigIsNil`].
    pub fn nil() -> Self {
        Self { draft: None }
    }

    fn set(mut self, apply: impl FnOnce(&mut Draft)) -> Self {
        if let Some(draft) = self.draft.as_mut() {
            apply(draft);
        }
        self
    }

    /// Sets the description.
    pub fn description(self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.set(|d| d.description = Some(description))
    }

    /// Sets the service name.
    pub fn name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.set(|d| d.name = Some(name))
    }

    /// Sets the executable.
    pub fn exec(self, exec: impl Into<PathBuf>) -> Self {
        let exec = exec.into();
        self.set(|d| d.exec = Some(exec))
    }

    /// Sets the argument string.
    pub fn args(self, args: impl Into<String>) -> Self {
        let args = args.into();
        self.set(|d| d.args = args)
    }

    /// Sets the working directory.
    pub fn work_dir(self, work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        self.set(|d| d.work_dir = Some(work_dir))
    }

    /// Sets the dependency list in the backend's native syntax.
    pub fn dependencies(self, dependencies: impl Into<String>) -> Self {
        let dependencies = dependencies.into();
        self.set(|d| d.dependencies = dependencies)
    }

    /// Sets the run-as user.
    pub fn user(self, user: impl Into<String>) -> Self {
        let user = user.into();
        self.set(|d| d.user = user)
    }

    /// Sets the run-as group.
    pub fn group(self, group: impl Into<String>) -> Self {
        let group = group.into();
        self.set(|d| d.group = group)
    }

    /// Sets the log file.
    pub fn log_file(self, log_file: impl Into<PathBuf>) -> Self {
        let log_file = log_file.into();
        self.set(|d| d.log_file = Some(log_file))
    }

    /// Sets the PID file.
    pub fn pid_file(self, pid_file: impl Into<PathBuf>) -> Self {
        let pid_file = pid_file.into();
        self.set(|d| d.pid_file = Some(pid_file))
    }

    /// Sets the lock file.
    pub fn lock_file(self, lock_file: impl Into<PathBuf>) -> Self {
        let lock_file = lock_file.into();
        self.set(|d| d.lock_file = Some(lock_file))
    }

    /// Overlays every key present in a service file.
    pub fn service_file(mut self, file: ServiceFile) -> Self {
        let ServiceFile {
            description,
            name,
            exec,
            args,
            work_dir,
            dependencies,
            user,
            group,
            log_file,
            pid_file,
            lock_file,
        } = file;
        if let Some(v) = description {
            self = self.description(v);
        }
        if let Some(v) = name {
            self = self.name(v);
        }
        if let Some(v) = exec {
            self = self.exec(v);
        }
        if let Some(v) = args {
            self = self.args(v);
        }
        if let Some(v) = work_dir {
            self = self.work_dir(v);
        }
        if let Some(v) = dependencies {
            self = self.dependencies(v);
        }
        if let Some(v) = user {
            self = self.user(v);
        }
        if let Some(v) = group {
            self = self.group(v);
        }
        if let Some(v) = log_file {
            self = self.log_file(v);
        }
        if let Some(v) = pid_file {
            self = self.pid_file(v);
        }
        if let Some(v) = lock_file {
            self = self.lock_file(v);
        }
        self
    }

    /// Validates the draft and fills derived defaults.
    pub fn build(self) -> Result<ServiceConfig> {
        let draft = self.draft.ok_or(DaemonError::ConfigIsNil)?;
        let exec = draft
            .exec
            .filter(|exec| !exec.as_os_str().is_empty())
            .ok_or(DaemonError::MissingExecValue)?;

        let name = draft
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| base_name(&exec));
        validate_name(&name)?;
        let work_dir = draft
            .work_dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| parent_dir(&exec));

        Ok(ServiceConfig {
            description: draft
                .description
                .unwrap_or_else(|| default_description(&name)),
            log_file: draft
                .log_file
                .unwrap_or_else(|| default_log_file(&name).into()),
            pid_file: draft
                .pid_file
                .unwrap_or_else(|| default_pid_file(&name).into()),
            lock_file: draft
                .lock_file
                .unwrap_or_else(|| default_lock_file(&name).into()),
            name,
            exec,
            args: draft.args,
            work_dir,
            dependencies: draft.dependencies,
            user: draft.user,
            group: draft.group,
        })
    }
}

/// Every artifact path embeds the name, so it must stay a single plain
/// path component.
fn validate_name(name: &str) -> Result<()> {
    let invalid = name == "."
        || name == ".."
        || name.starts_with('-')
        || name
            .chars()
            .any(|c| c == '/' || c.is_whitespace() || c.is_control());
    if invalid {
        return Err(DaemonError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn base_name(exec: &Path) -> String {
    exec.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| exec.to_string_lossy().into_owned())
}

fn parent_dir(exec: &Path) -> PathBuf {
    match exec.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// On-disk form of a service configuration. Every key is optional and
/// overrides the corresponding default.
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceFile {
    pub description: Option<String>,
    pub name: Option<String>,
    pub exec: Option<String>,
    pub args: Option<String>,
    pub work_dir: Option<String>,
    pub dependencies: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub log_file: Option<String>,
    pub pid_file: Option<String>,
    pub lock_file: Option<String>,
}

/// Expands `${VAR}` references from the environment. `$$` is a literal `$`;
/// any other `$` (such as sysv facility names like `$network`) is kept as is.
fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex");
    let mut expanded = String::with_capacity(input.len());
    let mut last = 0;
    for caps in re.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        expanded.push_str(&input[last..whole.start()]);
        match caps.get(1) {
            Some(var) => {
                let value = env::var(var.as_str())
                    .map_err(|_| DaemonError::MissingEnvVar(var.as_str().into()))?;
                expanded.push_str(&value);
            }
            None => expanded.push('$'),
        }
        last = whole.end();
    }
    expanded.push_str(&input[last..]);
    Ok(expanded)
}

/// Parses a YAML service file, expanding environment variables first.
pub fn parse_service_file(content: &str) -> Result<ServiceFile> {
    let expanded = expand_env_vars(content)?;
    if expanded.trim().is_empty() {
        return Ok(ServiceFile::default());
    }
    Ok(serde_yaml::from_str(&expanded)?)
}

/// Loads a YAML service file from disk.
pub fn load_service_file(path: impl AsRef<Path>) -> Result<ServiceFile> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| DaemonError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_service_file(&content)
}
