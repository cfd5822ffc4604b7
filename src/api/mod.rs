//! REST API layer: route handlers, DTOs, OpenAPI document and router
//! composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root.

pub mod dto;
pub mod handlers;
pub mod openapi;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Upper bound on REST request handling time. Not applied to `/ws`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
}

/// Builds the full application: REST routes with a request timeout, the
/// `/ws` upgrade route, tracing and CORS layers, bound to `state`.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(build_router().layer(TimeoutLayer::new(REQUEST_TIMEOUT)))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ConnectionConfig;
    use crate::domain::UserId;
    use crate::hub::Hub;
    use crate::ws::Connection;

    fn app(hub: &Hub) -> Router {
        build_app(AppState::new(hub.clone(), ConnectionConfig::default()))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        let Ok(request) = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
        else {
            panic!("invalid request");
        };
        request
    }

    fn get(uri: &str) -> Request<Body> {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("invalid request");
        };
        request
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        serde_json::from_slice(&bytes).unwrap_or_default()
    }

    #[tokio::test]
    async fn notify_user_accepts_and_delivers() {
        let hub = Hub::new();
        let (connection, mut session) = Connection::new(UserId::from("u1"), 4);
        let Ok(_) = hub.register(connection).await else {
            panic!("register failed");
        };

        let Ok(response) = app(&hub)
            .oneshot(post_json(
                "/api/v1/notifications/users/u1",
                r#"{"category":"ci","title":"Build passed"}"#,
            ))
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["user_id"], "u1");
        assert!(body["notification_id"].is_string());
        assert!(session.queue.try_recv().is_ok());
    }

    #[tokio::test]
    async fn invalid_notification_is_rejected() {
        let hub = Hub::new();
        let Ok(response) = app(&hub)
            .oneshot(post_json(
                "/api/v1/notifications/broadcast",
                r#"{"category":"ci","title":""}"#,
            ))
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], 1001);
    }

    #[tokio::test]
    async fn stats_reflect_registry() {
        let hub = Hub::new();
        let mut sessions = Vec::new();
        for user in ["u1", "u1", "u2"] {
            let (connection, session) = Connection::new(UserId::from(user), 4);
            let Ok(_) = hub.register(connection).await else {
                panic!("register failed");
            };
            sessions.push(session);
        }

        let Ok(response) = app(&hub).oneshot(get("/api/v1/hub/stats")).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_connections"], 3);
        assert_eq!(body["total_users"], 2);
        assert_eq!(body["per_user_connections"]["u1"], 2);
    }

    #[tokio::test]
    async fn shutdown_turns_producers_away() {
        let hub = Hub::new();
        hub.shutdown().await;

        let Ok(response) = app(&hub)
            .oneshot(post_json("/api/v1/system/announce", r#"{"message":"bye"}"#))
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let Ok(health) = app(&hub).oneshot(get("/health")).await else {
            panic!("request failed");
        };
        assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
