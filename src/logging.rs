//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Level priority:
//! 1. `--log-level` flag
//! 2. `TASKDEPS_LOG` filter directive (e.g. `debug`, `taskdeps=trace`)
//! 3. `warn`
//!
//! Output goes to stderr; stdout belongs to command output.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use crate::error::{DepsError, Result};

pub const ENV_LOG: &str = "TASKDEPS_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

fn directive(cli_level: Option<LogLevel>, env_value: Option<String>) -> String {
    match (cli_level, env_value) {
        (Some(level), _) => level.as_directive().to_string(),
        (None, Some(value)) if !value.trim().is_empty() => value.trim().to_string(),
        _ => LogLevel::Warn.as_directive().to_string(),
    }
}

fn build_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| DepsError::Logging(format!("bad filter '{directive}': {e}")))
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(&directive(cli_level, std::env::var(ENV_LOG).ok()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| DepsError::Logging(e.to_string()))
}
