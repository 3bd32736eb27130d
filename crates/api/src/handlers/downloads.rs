//! Handlers for the provisioning script downloads.

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Text served at the root so operators can check the host is up.
pub const BANNER: &str = "PowerShell Hosting Server is running locally.";

/// GET /
pub async fn banner() -> &'static str {
    BANNER
}

/// GET /{script}
///
/// Serves a catalog script as a text attachment. Names outside the catalog
/// are 404; a catalog entry whose file cannot be read is 500.
pub async fn download_script(
    State(state): State<AppState>,
    Path(script): Path<String>,
) -> AppResult<Response> {
    let asset = state.catalog.get(&script)?;
    let path = state.catalog.path_of(asset);

    let content = tokio::fs::read(&path).await.map_err(|e| {
        AppError::ScriptUnavailable(format!("{}: {e}", path.display()))
    })?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename={}", asset.file_name))
        .map_err(|e| AppError::InternalError(format!("Invalid script file name: {e}")))?;

    tracing::debug!(script = %asset.name, bytes = content.len(), "Serving script download");

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}
