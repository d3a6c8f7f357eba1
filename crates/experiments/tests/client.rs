//! Client tests against a local stand-in for the A/B testing service.

use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use storefront_core::experiment::{
    AssignmentContext, AssignmentProvider, ExperimentCatalog, ProviderError,
};
use storefront_core::page_type::PageType;
use storefront_experiments::AbTestingClient;

async fn active(Query(params): Query<std::collections::HashMap<String, String>>) -> Json<Value> {
    if params.get("page_type").map(String::as_str) != Some("cart") {
        return Json(json!({"experiments": []}));
    }
    Json(json!({
        "experiments": [{
            "id": "exp-hero",
            "name": "Hero color",
            "variants": [
                {"id": "control", "name": "Control", "is_control": true},
                {"id": "blue", "name": "Blue", "slot_overrides": {"hero": {"styles": {"color": "blue"}}}}
            ]
        }]
    }))
}

async fn active_with_malformed_entry() -> Json<Value> {
    Json(json!({
        "experiments": [
            {
                "id": "good",
                "name": "Good",
                "variants": [
                    {"id": "blue", "name": "Blue", "slot_overrides": {"hero": {"styles": {"color": "blue"}}}}
                ]
            },
            {
                "id": "bad",
                "name": "Bad",
                "variants": [
                    {"id": "red", "name": "Red", "slot_overrides": {"hero": {"styles": "color: red"}}}
                ]
            }
        ]
    }))
}

async fn assign(
    Path(experiment_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if experiment_id == "missing" {
        return Err(StatusCode::NOT_FOUND);
    }
    if experiment_id == "garbled" {
        return Ok(Json(json!({"unexpected": true})));
    }
    let is_control = body["session_id"] == json!("control-session");
    Ok(Json(json!({
        "variant_id": if is_control { "control" } else { "blue" },
        "variant_name": if is_control { "Control" } else { "Blue" },
        "is_control": is_control
    })))
}

async fn spawn_service() -> String {
    serve(
        Router::new()
            .route("/api/experiments/active", get(active))
            .route("/api/experiments/{experiment_id}/assignments", post(assign)),
    )
    .await
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn context() -> AssignmentContext {
    AssignmentContext {
        store_id: 1,
        page_type: Some(PageType::Cart),
        ..Default::default()
    }
}

#[tokio::test]
async fn fetches_active_experiments_for_page() {
    let base = spawn_service().await;
    let client = AbTestingClient::new(&base, Duration::from_secs(2)).unwrap();

    let experiments = client.active_experiments(1, PageType::Cart).await.unwrap();
    assert_eq!(experiments.len(), 1);
    assert_eq!(experiments[0].id, "exp-hero");
    let blue = experiments[0].variant("blue").unwrap();
    assert!(blue.slot_overrides.contains_key("hero"));

    let none = client.active_experiments(1, PageType::Product).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn malformed_experiment_is_skipped_and_others_kept() {
    let app = Router::new().route("/api/experiments/active", get(active_with_malformed_entry));
    let base = serve(app).await;
    let client = AbTestingClient::new(&base, Duration::from_secs(2)).unwrap();

    let experiments = client.active_experiments(1, PageType::Cart).await.unwrap();
    let ids: Vec<&str> = experiments.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["good"]);
    assert!(experiments[0].variant("blue").unwrap().slot_overrides.contains_key("hero"));
}

#[tokio::test]
async fn assigns_sticky_variant() {
    let base = spawn_service().await;
    let client = AbTestingClient::new(&base, Duration::from_secs(2)).unwrap();

    let treatment = client
        .get_variant("exp-hero", "session-a", &context())
        .await
        .unwrap();
    assert_eq!(treatment.variant_id, "blue");
    assert!(!treatment.is_control);

    let control = client
        .get_variant("exp-hero", "control-session", &context())
        .await
        .unwrap();
    assert!(control.is_control);
}

#[tokio::test]
async fn error_status_is_unavailable() {
    let base = spawn_service().await;
    let client = AbTestingClient::new(&base, Duration::from_secs(2)).unwrap();

    let err = client
        .get_variant("missing", "session-a", &context())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Unavailable(msg) if msg.contains("404")));
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let base = spawn_service().await;
    let client = AbTestingClient::new(&base, Duration::from_secs(2)).unwrap();

    let err = client
        .get_variant("garbled", "session-a", &context())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_service_is_unavailable() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        AbTestingClient::new(&format!("http://{addr}"), Duration::from_millis(300)).unwrap();
    let err = client.active_experiments(1, PageType::Cart).await.unwrap_err();
    assert!(matches!(err, ProviderError::Unavailable(_)));
}
