use std::sync::Arc;

use scripthost_core::catalog::ScriptCatalog;
use scripthost_core::scripting::ScriptRunner;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Downloadable scripts.
    pub catalog: Arc<ScriptCatalog>,
    /// Launches the configured script process for `POST /run_script`.
    pub runner: Arc<ScriptRunner>,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// Fails if the configured runner command is invalid.
    pub fn from_config(config: ServerConfig) -> Result<Self, scripthost_core::error::CoreError> {
        let runner = ScriptRunner::new(config.runner_command()?, config.runner_limits());
        let catalog = ScriptCatalog::standard(config.scripts_dir.clone());

        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            runner: Arc::new(runner),
        })
    }
}
