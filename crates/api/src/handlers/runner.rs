//! Handler that runs the configured script and streams its output.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use futures::stream;
use scripthost_core::scripting::RunHandle;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /run_script
///
/// Spawns the configured command and streams its output as a chunked
/// `text/plain` body: stdout lines verbatim, stderr lines prefixed with
/// `ERROR: `, then a final `Process exited with code <N>`.
///
/// Spawn failures and a full runner are reported as JSON errors before any
/// body is sent. Once streaming starts the status stays 200.
///
/// The body owns the run. If the client disconnects, hyper drops the body,
/// which cancels the run and kills the process.
pub async fn run_script(State(state): State<AppState>) -> AppResult<Response> {
    let handle = state.runner.start()?;
    let pid = handle.pid();

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff");

    if let Some(pid) = pid {
        response = response.header("x-process-id", HeaderValue::from(pid));
    }

    response
        .body(event_body(handle))
        .map_err(|e| AppError::InternalError(format!("Failed to build run response: {e}")))
}

/// Turn a run into a streaming body, one frame per event.
fn event_body(handle: RunHandle) -> Body {
    let frames = stream::unfold(handle, |mut handle| async move {
        let event = handle.next_event().await?;
        Some((Ok::<_, Infallible>(Bytes::from(event.into_bytes())), handle))
    });
    Body::from_stream(frames)
}
