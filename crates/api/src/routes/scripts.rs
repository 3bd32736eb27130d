use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Script routes, mounted at the root.
///
/// ```text
/// /                     banner (GET)
/// /run_script           run the configured script, stream output (POST)
/// /{script}             download a catalog script (GET)
/// ```
///
/// Static paths win over `/{script}`, so `/health` and `/run_script` are
/// never treated as script names.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::downloads::banner))
        .route("/run_script", post(handlers::runner::run_script))
        .route("/{script}", get(handlers::downloads::download_script))
}
