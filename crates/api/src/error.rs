use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use scripthost_core::error::CoreError;
use scripthost_core::scripting::ScriptError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`ScriptError`] and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
/// Only ever returned before a response body starts.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `scripthost_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The script process could not be started.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// A catalog script exists but its file could not be read.
    #[error("Script unavailable: {0}")]
    ScriptUnavailable(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
            },

            // --- Script process errors ---
            AppError::Script(ScriptError::Busy { limit }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "RUNNER_BUSY",
                format!("All {limit} script runs are in use, try again later"),
            ),
            AppError::Script(err) => {
                tracing::error!(error = %err, "Script process failed to start");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SPAWN_FAILED",
                    "Failed to start script process".to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::ScriptUnavailable(msg) => {
                tracing::error!(error = %msg, "Script file unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SCRIPT_UNAVAILABLE",
                    "Failed to load script".to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
