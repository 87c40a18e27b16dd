//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use reelstore::{api::create_router, AppState, ByteBudgetStore};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_router(AppState::new(ByteBudgetStore::new()))
}

fn create_small_app(budget: usize) -> Router {
    create_router(AppState::new(ByteBudgetStore::with_budget(budget).unwrap()))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == Namespace Endpoint Tests ==

#[tokio::test]
async fn test_create_namespace_user_tables() {
    let app = create_test_app();

    let (status, json) = send(&app, "PUT", "/namespaces/Alice", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["namespace"], "alice");
    let tables = json["document"]["tables"].as_object().unwrap();
    assert_eq!(tables.len(), 9);
    assert!(tables.contains_key("authentication"));
    assert!(!tables.contains_key("homePage"));
}

#[tokio::test]
async fn test_create_namespace_also_creates_default() {
    let app = create_test_app();
    send(&app, "PUT", "/namespaces/alice", None).await;

    let (status, json) = send(&app, "GET", "/namespaces/default", None).await;

    assert_eq!(status, StatusCode::OK);
    let tables = json["document"]["tables"].as_object().unwrap();
    assert_eq!(tables.len(), 4);
    assert!(tables.contains_key("homePage"));
}

#[tokio::test]
async fn test_create_namespace_idempotent() {
    let app = create_test_app();
    let (_, first) = send(&app, "PUT", "/namespaces/alice", None).await;
    let (_, stats_before) = send(&app, "GET", "/stats", None).await;

    let (status, second) = send(&app, "PUT", "/namespaces/alice", None).await;
    let (_, stats_after) = send(&app, "GET", "/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(stats_before["space_used"], stats_after["space_used"]);
}

#[tokio::test]
async fn test_get_missing_namespace() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/namespaces/ghost", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("ghost"));
}

// == Append Endpoint Tests ==

#[tokio::test]
async fn test_append_record() {
    let app = create_test_app();
    send(&app, "PUT", "/namespaces/alice", None).await;

    let (status, json) = send(
        &app,
        "POST",
        "/namespaces/alice/records",
        Some(json!({"table": "ratings", "key": "Film-1", "payload": {"stars": 4}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["appended"], true);
    assert_eq!(json["key"], "film-1");

    let (_, namespace) = send(&app, "GET", "/namespaces/alice", None).await;
    let ratings = namespace["document"]["tables"]["ratings"].as_array().unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0]["key"], "film-1");
    assert_eq!(ratings[0]["payload"]["stars"], 4);
    assert!(ratings[0]["parentID"].is_string());
    assert!(ratings[0]["timestamp"].is_u64());
}

#[tokio::test]
async fn test_append_outside_schema_is_noop() {
    let app = create_test_app();
    send(&app, "PUT", "/namespaces/default", None).await;

    let (status, json) = send(
        &app,
        "POST",
        "/namespaces/default/records",
        Some(json!({"table": "favourites", "key": "film", "payload": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["appended"], false);
}

#[tokio::test]
async fn test_append_to_missing_namespace() {
    let app = create_test_app();

    let (status, _) = send(
        &app,
        "POST",
        "/namespaces/ghost/records",
        Some(json!({"table": "ratings", "key": "film", "payload": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_append_empty_key() {
    let app = create_test_app();
    send(&app, "PUT", "/namespaces/alice", None).await;

    let (status, json) = send(
        &app,
        "POST",
        "/namespaces/alice/records",
        Some(json!({"table": "ratings", "key": "", "payload": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_append_beyond_budget() {
    let app = create_small_app(2_000);
    send(&app, "PUT", "/namespaces/erin", None).await;
    let (_, before) = send(&app, "GET", "/stats", None).await;

    let (status, json) = send(
        &app,
        "POST",
        "/namespaces/erin/records",
        Some(json!({"table": "profile", "key": "profile", "payload": "x".repeat(3_000)})),
    )
    .await;
    let (_, after) = send(&app, "GET", "/stats", None).await;

    assert_eq!(status, StatusCode::INSUFFICIENT_STORAGE);
    assert!(json["error"].as_str().unwrap().contains("Capacity"));
    assert_eq!(before["space_used"], after["space_used"]);
}

#[tokio::test]
async fn test_append_evicts_when_full() {
    let app = create_small_app(2_000);
    send(&app, "PUT", "/namespaces/default", None).await;

    for i in 0..20 {
        let (status, _) = send(
            &app,
            "POST",
            "/namespaces/default/records",
            Some(json!({"table": "movies", "key": format!("page-{}", i), "payload": "m".repeat(80)})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert!(stats["evictions"].as_u64().unwrap() > 0);
    assert!(stats["space_used"].as_u64().unwrap() <= 2_000);

    let (_, namespace) = send(&app, "GET", "/namespaces/default", None).await;
    let movies = namespace["document"]["tables"]["movies"].as_array().unwrap();
    assert_eq!(movies.last().unwrap()["key"], "page-19");
    assert_ne!(movies[0]["key"], "page-0");
}

// == Term Probe Endpoint Tests ==

#[tokio::test]
async fn test_cached_term_hit_and_miss() {
    let app = create_test_app();
    send(&app, "PUT", "/namespaces/default", None).await;
    send(
        &app,
        "POST",
        "/namespaces/default/records",
        Some(json!({"table": "searchTerms", "key": "batman", "payload": [{"results": []}]})),
    )
    .await;

    let (status, hit) = send(&app, "GET", "/namespaces/default/tables/searchTerms/terms/Batman", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hit["cached"], true);
    assert_eq!(hit["payload"], json!([{"results": []}]));

    let (_, miss) = send(&app, "GET", "/namespaces/default/tables/searchTerms/terms/joker", None).await;
    assert_eq!(miss["cached"], false);
}

#[tokio::test]
async fn test_cached_term_unknown_table() {
    let app = create_test_app();
    send(&app, "PUT", "/namespaces/default", None).await;

    let (status, _) = send(&app, "GET", "/namespaces/default/tables/apiCalls/terms/x", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// == Account and Summary Endpoint Tests ==

#[tokio::test]
async fn test_account_lookup_ignores_case() {
    let app = create_test_app();
    send(&app, "PUT", "/namespaces/bob", None).await;
    send(
        &app,
        "POST",
        "/namespaces/bob/records",
        Some(json!({
            "table": "authentication",
            "key": "authentication",
            "payload": [{"username": "bob", "email": "Bob@Example.com", "password": "hashed", "isActive": true}]
        })),
    )
    .await;

    let (status, json) = send(&app, "GET", "/accounts/BOB@example.com", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "bob");
    assert_eq!(json["email"], "bob@example.com");
    assert!(json.get("password").is_none());

    let (status, _) = send(&app, "GET", "/accounts/eve@example.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_summary_counts_records() {
    let app = create_test_app();
    send(&app, "PUT", "/namespaces/carol", None).await;
    for film in ["a", "b"] {
        send(
            &app,
            "POST",
            "/namespaces/carol/records",
            Some(json!({"table": "watchingList", "key": film, "payload": {"id": film}})),
        )
        .await;
    }

    let (status, json) = send(&app, "GET", "/namespaces/carol/summary", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["watchingList"], 2);
    assert_eq!(json["favourites"], 0);
    assert!(json["account"].is_null());
}

// == Home Page Endpoint Tests ==

#[tokio::test]
async fn test_home_section_saved_in_default() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        "PUT",
        "/home/featured",
        Some(json!({"title": "Picks", "description": "Weekly picks"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["namespace"], "default");

    let (_, namespace) = send(&app, "GET", "/namespaces/default", None).await;
    let home = namespace["document"]["tables"]["homePage"].as_array().unwrap();
    assert_eq!(home[0]["key"], "featured");
    assert_eq!(home[0]["payload"][0]["title"], "Picks");
}

#[tokio::test]
async fn test_home_section_requires_title() {
    let app = create_test_app();

    let (status, _) = send(&app, "PUT", "/home/featured", Some(json!({"title": " "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// == Search, Stats and Health Endpoint Tests ==

#[tokio::test]
async fn test_search_without_metadata_client() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/search/batman", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_stats_endpoint_reports_budget() {
    let app = create_small_app(100_000);
    send(&app, "PUT", "/namespaces/alice", None).await;

    let (status, json) = send(&app, "GET", "/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["budget"], 100_000);
    assert_eq!(json["total_entries"], 2);
    assert!(json["space_used"].as_u64().unwrap() > 0);
    assert_eq!(json["hit_rate"], 0.0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
