use std::path::PathBuf;
use std::time::Duration;

use scripthost_core::error::CoreError;
use scripthost_core::scripting::{RunnerCommand, RunnerLimits};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// Time allowed to produce response headers, in seconds (default: `30`).
    /// Streaming bodies are not cut off by this.
    pub request_timeout_secs: u64,
    /// Directory holding the downloadable scripts (default: `scripts`).
    pub scripts_dir: PathBuf,
    /// Executable launched by `POST /run_script` (default: `pwsh`).
    pub runner_program: String,
    /// Arguments for [`Self::runner_program`], comma separated in `RUNNER_ARGS`.
    pub runner_args: Vec<String>,
    /// Working directory of each run (default: inherit ours).
    pub runner_workdir: Option<PathBuf>,
    /// Extra child environment, `KEY=VALUE` pairs comma separated in `RUNNER_ENV`.
    pub runner_env: Vec<(String, String)>,
    /// Maximum simultaneous script processes (default: `8`).
    pub max_concurrent_runs: usize,
    /// Per-run wall-clock limit in seconds, `0` for none (default: `0`).
    pub run_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                                                  |
    /// |------------------------|----------------------------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                                                |
    /// | `PORT`                 | `3000`                                                   |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`                                  |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                                     |
    /// | `SCRIPTS_DIR`          | `scripts`                                                |
    /// | `RUNNER_PROGRAM`       | `pwsh`                                                   |
    /// | `RUNNER_ARGS`          | `-NoProfile,-NonInteractive,-File,scripts/agent_vm_ulm.ps1` |
    /// | `RUNNER_WORKDIR`       | *(inherit)*                                              |
    /// | `RUNNER_ENV`           | *(none)*                                                 |
    /// | `MAX_CONCURRENT_RUNS`  | `8`                                                      |
    /// | `RUN_TIMEOUT_SECS`     | `0`                                                      |
    ///
    /// Panics on malformed numbers so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = split_list(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let scripts_dir =
            PathBuf::from(std::env::var("SCRIPTS_DIR").unwrap_or_else(|_| "scripts".into()));

        let runner_program = std::env::var("RUNNER_PROGRAM").unwrap_or_else(|_| "pwsh".into());

        let runner_args = split_list(&std::env::var("RUNNER_ARGS").unwrap_or_else(|_| {
            "-NoProfile,-NonInteractive,-File,scripts/agent_vm_ulm.ps1".into()
        }));

        let runner_workdir = std::env::var("RUNNER_WORKDIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let runner_env = parse_env_pairs(&std::env::var("RUNNER_ENV").unwrap_or_default())
            .expect("RUNNER_ENV entries must be KEY=VALUE");

        let max_concurrent_runs: usize = std::env::var("MAX_CONCURRENT_RUNS")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("MAX_CONCURRENT_RUNS must be a valid usize");

        let run_timeout_secs: u64 = std::env::var("RUN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("RUN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            scripts_dir,
            runner_program,
            runner_args,
            runner_workdir,
            runner_env,
            max_concurrent_runs,
            run_timeout_secs,
        }
    }

    /// The command every run executes.
    pub fn runner_command(&self) -> Result<RunnerCommand, CoreError> {
        let mut command =
            RunnerCommand::new(self.runner_program.clone(), self.runner_args.iter().cloned())?;
        if let Some(dir) = &self.runner_workdir {
            command = command.with_working_directory(dir);
        }
        for (key, value) in &self.runner_env {
            command = command.with_env(key, value);
        }
        Ok(command)
    }

    pub fn runner_limits(&self) -> RunnerLimits {
        RunnerLimits {
            max_concurrent_runs: self.max_concurrent_runs,
            run_timeout: (self.run_timeout_secs > 0)
                .then(|| Duration::from_secs(self.run_timeout_secs)),
        }
    }
}

/// Split a comma-separated env value, dropping blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `KEY=VALUE,KEY=VALUE`. `None` if an entry has no `=` or an empty key.
fn parse_env_pairs(raw: &str) -> Option<Vec<(String, String)>> {
    split_list(raw)
        .into_iter()
        .map(|entry| {
            let (key, value) = entry.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
