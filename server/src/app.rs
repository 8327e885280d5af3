use crate::api;
use crate::config::Config;
use crate::db::DbPool;
use axum::extract::{FromRef, MatchedPath};
use axum::http::Request;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across all handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub config: Arc<Config>,
}

/// Paths that get a trace-level span so they stay out of the request log
const QUIET_PATHS: &[&str] = &["/api/health"];

/// All routes, with state and request tracing applied.
pub fn router(state: AppState) -> Router {
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    Router::new()
        .nest("/api/health", api::health::router())
        .nest("/api/auth/token", api::auth::router())
        .nest("/api/users", api::users::router())
        .nest("/api/tags", api::tags::router())
        .nest("/api/ingredients", api::ingredients::router())
        .nest("/api/recipes", api::recipes::router())
        .nest("/media", api::media::router())
        .merge(api::short_link::router())
        .merge(swagger_ui)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    if QUIET_PATHS.contains(&matched_path) {
                        tracing::trace_span!("http_request")
                    } else {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            path = %matched_path,
                        )
                    }
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                            return;
                        }
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        )
}

/// The router wrapped so `/api/recipes/` and `/api/recipes` hit the same
/// route. Normalization has to run before routing, so it wraps the whole
/// router instead of being a router layer.
pub fn service(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::db::lazy_pool;
    use axum::body::Body;
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use tower::ServiceExt;

    /// State whose pool points at a closed port. Any handler that reaches
    /// the database fails, so these tests only cover paths that do not.
    fn offline_state() -> AppState {
        let config = test_config();
        AppState {
            pool: Arc::new(lazy_pool(&config.database_url)),
            config: Arc::new(config),
        }
    }

    fn server() -> TestServer {
        TestServer::new(router(offline_state())).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = server().get("/api/health").await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<serde_json::Value>(),
            serde_json::json!({"status": "ok"})
        );
    }

    #[tokio::test]
    async fn test_trailing_slash_is_accepted() {
        let response = service(offline_state())
            .oneshot(
                Request::builder()
                    .uri("/api/health/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_endpoints_require_token() {
        let server = server();
        for path in [
            "/api/users/me",
            "/api/recipes/download_shopping_cart",
            "/api/users/subscriptions",
        ] {
            let response = server.get(path).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            assert_eq!(
                response.json::<serde_json::Value>()["error"],
                "Authentication credentials were not provided."
            );
        }

        server
            .post("/api/recipes")
            .json(&serde_json::json!({"name": "Soup"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/api/recipes/1/favorite")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/api/auth/token/logout")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_authorization_header() {
        let response = server()
            .get("/api/users/me")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.json::<serde_json::Value>()["error"],
            "Invalid Authorization header format"
        );
    }

    #[tokio::test]
    async fn test_malformed_short_code_is_not_found() {
        let server = server();
        server.get("/r/abc").await.assert_status(StatusCode::NOT_FOUND);
        server
            .get("/api/recipes-short/ab-12!")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let response = server().get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let spec = response.json::<serde_json::Value>();
        assert!(spec["paths"]["/api/recipes/{id}/get-link"].is_object());
        assert!(spec["components"]["securitySchemes"]["token_auth"].is_object());
    }
}
