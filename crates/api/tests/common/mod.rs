#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use storefront_api::auth::jwt::{generate_access_token, JwtConfig};
use storefront_api::config::ServerConfig;
use storefront_api::routes;
use storefront_api::state::AppState;
use storefront_core::experiment::{AssignmentProvider, ExperimentCatalog, NoExperiments};
use storefront_core::template::BuiltinTemplates;
use storefront_core::types::DbId;
use storefront_db::memory::MemoryVersionStore;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub const STORE: DbId = 1;
pub const USER: DbId = 10;
pub const OTHER_USER: DbId = 20;

const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults and experiments disabled.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        ab_testing_url: None,
        ab_testing_timeout_ms: 500,
        template_dir: None,
    }
}

/// A signed editor token for `user_id`.
pub fn token(user_id: DbId) -> String {
    generate_access_token(user_id, "editor", &test_config().jwt).unwrap()
}

/// Full application over an in-memory store with no experiments running.
pub fn build_test_app() -> Router {
    build_test_app_with(Arc::new(NoExperiments), Arc::new(NoExperiments))
}

/// Full application over an in-memory store with the given providers.
///
/// Mirrors the router construction in `main.rs` so tests exercise the same
/// middleware stack production uses.
pub fn build_test_app_with(
    catalog: Arc<dyn ExperimentCatalog>,
    assignments: Arc<dyn AssignmentProvider>,
) -> Router {
    let state = AppState::new(
        test_config(),
        Arc::new(MemoryVersionStore::new()),
        Arc::new(BuiltinTemplates),
        catalog,
        assignments,
    );

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Editor route prefix for the test store.
pub fn slots(path: &str) -> String {
    format!("/api/v1/stores/{STORE}/slot-configurations{path}")
}

/// Send a request, authenticated as `user` when given.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<DbId>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token(user_id)));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

/// GET with one raw header, for malformed credentials.
pub async fn send_with_header(app: &Router, uri: &str, name: &str, value: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(name, value)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, user: Option<DbId>) -> Response {
    send(app, Method::GET, uri, user, None).await
}

pub async fn post(app: &Router, uri: &str, user: DbId) -> Response {
    send(app, Method::POST, uri, Some(user), None).await
}

pub async fn post_json(app: &Router, uri: &str, user: DbId, body: Value) -> Response {
    send(app, Method::POST, uri, Some(user), Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, user: DbId, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(user), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, user: DbId) -> Response {
    send(app, Method::DELETE, uri, Some(user), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert `status` and return the parsed body.
pub async fn expect_status(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}

/// A valid tree with one root container holding a text slot.
pub fn tree_json(label: &str) -> Value {
    serde_json::json!({
        "slots": {
            "main": {"type": "container", "children": ["hero"]},
            "hero": {"type": "text", "content": label}
        },
        "rootSlots": ["main"],
        "metadata": {"label": label}
    })
}
