#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use scripthost_api::config::ServerConfig;
use scripthost_api::router::build_app_router;
use scripthost_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// `sh -c 'exit 0'` as the runner command and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        scripts_dir: "scripts".into(),
        runner_program: "sh".to_string(),
        runner_args: vec!["-c".to_string(), "exit 0".to_string()],
        runner_workdir: None,
        runner_env: vec![],
        max_concurrent_runs: 8,
        run_timeout_secs: 0,
    }
}

/// Build the full application router from `config`.
pub fn build_test_app(config: ServerConfig) -> Router {
    let state = AppState::from_config(config).expect("valid test config");
    build_app_router(state)
}

/// App whose runner executes `body` through `sh -c`.
pub fn shell_app(body: &str) -> Router {
    let mut config = test_config();
    config.runner_args = vec!["-c".to_string(), body.to_string()];
    build_test_app(config)
}

/// App serving downloads from `dir`.
pub fn downloads_app(dir: &Path) -> Router {
    let mut config = test_config();
    config.scripts_dir = dir.to_path_buf();
    build_test_app(config)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri).await
}

async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Value of `name` in the response headers, as a string.
pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .map(|v| v.to_str().unwrap())
}
