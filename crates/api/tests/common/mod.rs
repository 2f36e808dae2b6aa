#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use bugtrack_api::config::{LogFormat, ServerConfig};
use bugtrack_api::router::build_app_router;
use bugtrack_api::state::AppState;
use bugtrack_core::bug::{Bug, BugChanges, Comment, NewBug};
use bugtrack_core::types::BugId;
use bugtrack_db::{BugFilter, BugPage, BugStore, MemoryBugStore, PageRequest, StoreError};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        database_max_connections: 1,
        log_format: LogFormat::Pretty,
    }
}

/// Build the full application router over `store`, with the same
/// middleware stack production uses.
pub fn build_test_app(store: Arc<dyn BugStore>) -> Router {
    let config = test_config();
    let state = AppState { store };
    build_app_router(state, &config)
}

/// A fresh app over an empty in-memory store.
pub fn memory_app() -> Router {
    build_test_app(Arc::new(MemoryBugStore::new()))
}

/// A store whose every operation fails, for exercising the 500 path.
pub struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Unavailable("connection refused".into())
}

#[async_trait]
impl BugStore for FailingStore {
    async fn list(&self, _: &BugFilter, _: PageRequest) -> Result<BugPage, StoreError> {
        Err(unavailable())
    }

    async fn find_by_id(&self, _: BugId) -> Result<Option<Bug>, StoreError> {
        Err(unavailable())
    }

    async fn create(&self, _: NewBug) -> Result<Bug, StoreError> {
        Err(unavailable())
    }

    async fn update(&self, _: BugId, _: &BugChanges) -> Result<Option<Bug>, StoreError> {
        Err(unavailable())
    }

    async fn add_comment(&self, _: BugId, _: Comment) -> Result<Option<Bug>, StoreError> {
        Err(unavailable())
    }

    async fn delete(&self, _: BugId) -> Result<bool, StoreError> {
        Err(unavailable())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(unavailable())
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A payload that passes every validation rule.
pub fn valid_bug() -> Value {
    json!({
        "title": "Login button unresponsive",
        "description": "Clicking the login button does nothing on Safari",
        "reporter": "John Doe",
        "severity": "high",
        "tags": ["ui", "auth"],
        "stepsToReproduce": ["Open the login page", "Click login"]
    })
}

/// Create a bug through the API and return its `data` object.
pub async fn create_bug(app: &Router, body: Value) -> Value {
    let response = post_json(app.clone(), "/api/bugs", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"].clone()
}
