// ABOUTME: Route definitions for the taskd HTTP API.
// ABOUTME: Assembles the health check and task routes into a single Axum Router with request tracing.

use axum::Router;
use axum::routing::{get, put};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/tasks",
            get(api::tasks::search_tasks).post(api::tasks::create_task),
        )
        .route(
            "/tasks/{id}",
            put(api::tasks::update_task).delete(api::tasks::delete_task),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use axum::body::Body;
    use http::Request;
    use std::sync::Arc;
    use taskd_store::{Database, DatabaseOptions};
    use tower::ServiceExt;

    async fn test_state(dir: &tempfile::TempDir) -> SharedState {
        let db = Database::open(dir.path().join("db.json"), DatabaseOptions::default())
            .await
            .unwrap();
        Arc::new(AppState::new(db))
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = create_router(test_state(&dir).await);
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = create_router(test_state(&dir).await);
        let resp = app
            .oneshot(Request::get("/projects").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn wrong_method_returns_405() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = create_router(test_state(&dir).await);
        let resp = app
            .oneshot(Request::post("/tasks/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 405);
    }
}
