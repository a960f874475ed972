//! Command-line interface for svcwrap.
use std::{path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    config::{ServiceConfigBuilder, load_service_file},
    error::Result,
};

/// Verbosity passed with `--log-level`: a level name or its 0-5 number,
/// as understood by `tracing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevelArg(LevelFilter);

impl LogLevelArg {
    /// The filter to install.
    pub fn filter(&self) -> LevelFilter {
        self.0
    }
}

impl FromStr for LogLevelArg {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = value.trim();
        // `LevelFilter` reads an empty string as "error".
        if trimmed.is_empty() {
            return Err("log level cannot be empty".into());
        }
        trimmed.parse::<LevelFilter>().map(LogLevelArg).map_err(|_| {
            format!("invalid log level '{trimmed}' (expected a level name or 0-5)")
        })
    }
}

/// Command-line interface for svcwrap.
#[derive(Parser, Debug)]
#[command(name = "svcwrap", version, author)]
#[command(about = "Install and manage a program as a system service", long_about = None)]
pub struct Cli {
    /// Override the logging verbosity for this invocation only.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,

    #[command(flatten)]
    pub service: ServiceArgs,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options describing the managed service. Anything left unset falls back to
/// the service file, then to defaults derived from the executable.
#[derive(Args, Debug, Default, Clone)]
pub struct ServiceArgs {
    /// YAML service file to load before applying flags.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Service name (defaults to the executable's file name).
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Program to wrap (defaults to this executable).
    #[arg(long, value_name = "PATH", global = true)]
    pub exec: Option<PathBuf>,

    /// Arguments passed to the program.
    #[arg(long, value_name = "ARGS", global = true, allow_hyphen_values = true)]
    pub args: Option<String>,

    /// Working directory (defaults to the executable's directory).
    #[arg(long, value_name = "DIR", global = true)]
    pub work_dir: Option<PathBuf>,

    /// Backend-specific dependency list.
    #[arg(long, global = true)]
    pub dependencies: Option<String>,

    /// User the service runs as.
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Group the service runs as.
    #[arg(long, global = true)]
    pub group: Option<String>,

    /// Human-readable description.
    #[arg(long, global = true)]
    pub description: Option<String>,

    /// Log file written by the service.
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// PID file.
    #[arg(long, value_name = "FILE", global = true)]
    pub pid_file: Option<PathBuf>,

    /// Lock file.
    #[arg(long, value_name = "FILE", global = true)]
    pub lock_file: Option<PathBuf>,
}

impl ServiceArgs {
    /// Layers the service file and then the flags over the defaults for the
    /// running executable.
    pub fn builder(&self) -> Result<ServiceConfigBuilder> {
        let mut builder = ServiceConfigBuilder::new();
        if let Some(path) = &self.config {
            builder = builder.service_file(load_service_file(path)?);
        }

        let args = self.clone();
        if let Some(v) = args.exec {
            builder = builder.exec(v);
        }
        if let Some(v) = args.name {
            builder = builder.name(v);
        }
        if let Some(v) = args.args {
            builder = builder.args(v);
        }
        if let Some(v) = args.work_dir {
            builder = builder.work_dir(v);
        }
        if let Some(v) = args.dependencies {
            builder = builder.dependencies(v);
        }
        if let Some(v) = args.user {
            builder = builder.user(v);
        }
        if let Some(v) = args.group {
            builder = builder.group(v);
        }
        if let Some(v) = args.description {
            builder = builder.description(v);
        }
        if let Some(v) = args.log_file {
            builder = builder.log_file(v);
        }
        if let Some(v) = args.pid_file {
            builder = builder.pid_file(v);
        }
        if let Some(v) = args.lock_file {
            builder = builder.lock_file(v);
        }
        Ok(builder)
    }
}

/// Available commands for svcwrap.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Generate the service artifact and register the service.
    Install,

    /// Enable the service at boot.
    Enable,

    /// Disable the service at boot.
    Disable,

    /// Stop the service and delete its artifacts.
    Remove,

    /// Start the installed service.
    Start,

    /// Stop the running service.
    Stop,

    /// Show whether the service is running.
    Status {
        /// Emit machine-readable JSON output.
        #[arg(long)]
        json: bool,
    },

    /// Follow the service log until interrupted.
    Log,
}

impl Commands {
    /// Whether the command changes the service's state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Commands::Status { .. } | Commands::Log)
    }
}

/// Parses command-line arguments and returns a `Cli` struct.
pub fn parse_args() -> Cli {
    Cli::parse()
}
