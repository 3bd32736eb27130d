//! Runner configuration and error types.
//!
//! The command a runner executes is fixed when the runner is built. Nothing
//! here is ever taken from request data.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// The external command launched for every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCommand {
    /// Executable name or path (e.g. `pwsh`).
    pub program: String,
    /// Arguments passed verbatim, typically interpreter flags and the script path.
    pub args: Vec<String>,
    /// Working directory for the child process (inherits ours if `None`).
    pub working_directory: Option<PathBuf>,
    /// Extra environment for the child, on top of the inherited one.
    pub env_vars: Vec<(String, String)>,
}

impl RunnerCommand {
    /// Build a command from a program and its arguments.
    ///
    /// Rejects an empty or whitespace-only program name.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(CoreError::Validation(
                "runner program must not be empty".to_string(),
            ));
        }

        Ok(Self {
            program,
            args: args.into_iter().map(Into::into).collect(),
            working_directory: None,
            env_vars: Vec::new(),
        })
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }
}

/// Resource bounds applied to every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerLimits {
    /// Maximum number of child processes alive at once.
    pub max_concurrent_runs: usize,
    /// Wall-clock limit per run. `None` lets a run go until it exits.
    pub run_timeout: Option<Duration>,
}

impl Default for RunnerLimits {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 8,
            run_timeout: None,
        }
    }
}

/// Failures that prevent a run from starting.
///
/// Once a run has started, problems are reported through the event stream
/// (exit code) and the logs, never through this type.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The configured executable does not exist.
    #[error("Executable not found: {0}")]
    NotFound(String),

    /// The configured executable exists but may not be executed.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Every run slot is taken.
    #[error("Runner busy: {limit} runs already in progress")]
    Busy { limit: usize },

    /// Any other I/O failure while spawning the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScriptError {
    /// Classify a spawn failure for `program`.
    pub fn from_spawn(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::Io(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
