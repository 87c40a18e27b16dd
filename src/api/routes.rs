//! API Routes
//!
//! Configures the Axum router with all document store endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    account_handler, append_handler, cached_term_handler, create_namespace_handler,
    get_namespace_handler, health_handler, home_section_handler, search_handler, stats_handler,
    summary_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /namespaces/:name` - Create a namespace's tables
/// - `GET /namespaces/:name` - Read a namespace document
/// - `POST /namespaces/:name/records` - Append a record
/// - `GET /namespaces/:name/tables/:table/terms/:term` - Probe a cached term
/// - `GET /namespaces/:name/summary` - Account and record counts
/// - `GET /accounts/:email` - Find an account in any namespace
/// - `PUT /home/:section` - Save a home page section
/// - `GET /search/:term` - Cache-aside metadata search
/// - `GET /stats` - Space accounting and counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route(
            "/namespaces/:name",
            put(create_namespace_handler).get(get_namespace_handler),
        )
        .route("/namespaces/:name/records", post(append_handler))
        .route(
            "/namespaces/:name/tables/:table/terms/:term",
            get(cached_term_handler),
        )
        .route("/namespaces/:name/summary", get(summary_handler))
        .route("/accounts/:email", get(account_handler))
        .route("/home/:section", put(home_section_handler))
        .route("/search/:term", get(search_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ByteBudgetStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::new(ByteBudgetStore::new()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_namespace_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/namespaces/alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_namespace_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/namespaces/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_unconfigured() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search/batman")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
