//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server or
//! router is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use scripthost_api::error::AppError;
use scripthost_core::error::CoreError;
use scripthost_core::scripting::ScriptError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Script",
        id: "bogus".to_string(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Script with id bogus not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("runner program must not be empty".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "runner program must not be empty");
}

#[tokio::test]
async fn spawn_not_found_returns_500_spawn_failed() {
    let err = AppError::Script(ScriptError::NotFound("/opt/secret/pwsh".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "SPAWN_FAILED");
    assert_eq!(json["error"], "Failed to start script process");
    assert!(
        !json.to_string().contains("/opt/secret"),
        "Spawn errors must not leak the configured program path"
    );
}

#[tokio::test]
async fn spawn_permission_denied_returns_500_spawn_failed() {
    let err = AppError::Script(ScriptError::PermissionDenied("run.sh".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "SPAWN_FAILED");
}

#[tokio::test]
async fn busy_runner_returns_503() {
    let err = AppError::Script(ScriptError::Busy { limit: 2 });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "RUNNER_BUSY");
    assert!(json["error"].as_str().unwrap().contains('2'));
}

#[tokio::test]
async fn script_unavailable_uses_fixed_message() {
    let err = AppError::ScriptUnavailable("/srv/scripts/init_nginx.sh: permission denied".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "SCRIPT_UNAVAILABLE");
    assert_eq!(json["error"], "Failed to load script");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret detail leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(
        !json.to_string().contains("secret"),
        "Internal error response must not leak sensitive details"
    );
    assert_eq!(json["error"], "An internal error occurred");
}
