//! Rendering of the generated service artifacts.
//!
//! Templates use `{{ field }}` placeholders naming [`ServiceConfig`] fields.
//! The bundled templates are fixed at compile time, so a rendering failure
//! points at a packaging defect rather than at user input.
use std::sync::OnceLock;

use regex::Regex;

use crate::{
    config::ServiceConfig,
    error::{DaemonError, Result},
};

/// A named artifact template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    /// Name used in error messages.
    pub name: &'static str,
    /// Template text.
    pub source: &'static str,
    /// Substituted for `{{ dependencies }}` when the configuration has none.
    pub default_dependencies: &'static str,
}

/// Unit file for the unit-based manager.
pub const SYSTEMD_UNIT: Template = Template {
    name: "systemd.service",
    source: include_str!("../templates/systemd.service"),
    default_dependencies: "network-online.target local-fs.target time-sync.target nss-lookup.target",
};

/// Init script for sysv-style hosts.
pub const SYSV_SCRIPT: Template = Template {
    name: "sysv.sh",
    source: include_str!("../templates/sysv.sh"),
    default_dependencies: "$network $time $named $local_fs",
};

/// Log-rotation config emitted alongside the init script.
pub const LOGROTATE_CONF: Template = Template {
    name: "logrotate.conf",
    source: include_str!("../templates/logrotate.conf"),
    default_dependencies: "",
};

/// Program block for the supervisor.
pub const SUPERVISOR_PROGRAM: Template = Template {
    name: "supervisor.ini",
    source: include_str!("../templates/supervisor.ini"),
    default_dependencies: "",
};

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_]+)\s*\}\}").expect("static regex")
    })
}

impl Template {
    /// Fills every placeholder from `config`.
    pub fn render(&self, config: &ServiceConfig) -> Result<String> {
        let source = self.source;
        let mut rendered = String::with_capacity(source.len() + 256);
        let mut last = 0;

        for caps in placeholder().captures_iter(source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            self.push_literal(&mut rendered, &source[last..whole.start()])?;
            rendered.push_str(&self.field(config, &caps[1])?);
            last = whole.end();
        }
        self.push_literal(&mut rendered, &source[last..])?;

        Ok(rendered)
    }

    fn push_literal(&self, out: &mut String, literal: &str) -> Result<()> {
        if literal.contains("{{") || literal.contains("}}") {
            return Err(self.error("unterminated or malformed placeholder"));
        }
        out.push_str(literal);
        Ok(())
    }

    fn field(&self, config: &ServiceConfig, field: &str) -> Result<String> {
        let value = match field {
            "description" => config.description.clone(),
            "name" => config.name.clone(),
            "exec" => config.exec.display().to_string(),
            "args" => config.args.clone(),
            "work_dir" => config.work_dir.display().to_string(),
            "dependencies" if config.dependencies.is_empty() => {
                self.default_dependencies.to_string()
            }
            "dependencies" => config.dependencies.clone(),
            "user" => config.user.clone(),
            "group" => config.group.clone(),
            "log_file" => config.log_file.display().to_string(),
            "pid_file" => config.pid_file.display().to_string(),
            "lock_file" => config.lock_file.display().to_string(),
            unknown => return Err(self.error(format!("unknown field '{unknown}'"))),
        };
        Ok(value)
    }

    fn error(&self, reason: impl Into<String>) -> DaemonError {
        DaemonError::Template {
            template: self.name,
            reason: reason.into(),
        }
    }
}
