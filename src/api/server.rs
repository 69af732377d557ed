//! API Server Module
//!
//! Application state, router assembly, and server startup.

use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Json, Router};
use tower_http::cors::{Any, CorsLayer};

use super::routes;
use crate::auth::TokenService;
use crate::common::Result;
use crate::config::AppConfig;
use crate::storage::SqliteStore;

/// Combined application state for all API endpoints
pub struct AppState {
    /// Persistent store
    pub store: Arc<SqliteStore>,
    /// Token issue/verify service
    pub tokens: TokenService,
}

/// Shared application state type
pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub fn new(store: SqliteStore, tokens: TokenService) -> SharedAppState {
        Arc::new(Self {
            store: Arc::new(store),
            tokens,
        })
    }
}

/// Create the API router
pub fn create_router(state: SharedAppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .nest("/auth", routes::auth::router())
        .nest("/user", routes::users::router())
        .nest("/hospital", routes::hospitals::router())
        .nest("/wilaya", routes::wilayas::router())
        .nest("/donation", routes::donations::router())
        .nest("/donation-request", routes::requests::router())
        .nest("/notification", routes::notifications::router())
        .nest("/admin", routes::admin::router())
        .nest("/stats", routes::stats::router())
        .nest("/map", routes::map::router())
        .layer(cors)
        .with_state(state)
}

/// GET /health
///
/// Liveness check.
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "hayat-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Start the API server
pub async fn start_server(config: AppConfig) -> Result<()> {
    let store = SqliteStore::new(&config.db_path)?;
    let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl_secs);
    let state = AppState::new(store, tokens);

    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!(target: "hayat::api", "listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared helpers for router-level tests.

    use super::*;
    use axum::body::Body;
    use axum::http::{Request, Response};
    use tower::ServiceExt;

    pub fn state() -> SharedAppState {
        AppState::new(
            SqliteStore::in_memory().unwrap(),
            TokenService::new("test-secret", 3600),
        )
    }

    pub fn app() -> Router {
        create_router(state())
    }

    /// Fire one request at the router.
    pub async fn send(app: &Router, request: Request<Body>) -> Response<axum::body::Body> {
        app.clone().oneshot(request).await.unwrap()
    }

    pub fn json_request(
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    pub async fn body_json(response: Response<axum::body::Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = testing::app();

        let response = testing::send(&app, testing::get_request("/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = testing::body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "hayat-api");
    }
}
