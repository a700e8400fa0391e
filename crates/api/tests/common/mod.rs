use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use segflow_api::config::ServerConfig;
use segflow_api::extract::ACTOR_HEADER;
use segflow_api::routes;
use segflow_api::state::AppState;
use segflow_api::storage::{BlobStore, LocalStore};
use segflow_core::archive::MAX_ARCHIVE_BYTES;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout, and a throwaway media root.
pub fn test_config(media_root: std::path::PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        media_root,
        max_archive_bytes: MAX_ARCHIVE_BYTES,
        mask_proposal_url: None,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and a per-test temporary media directory.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_media(pool).0
}

/// Like [`build_test_app`], but also returns the media root so a test can
/// inspect the files the app wrote.
pub fn build_test_app_with_media(pool: PgPool) -> (Router, std::path::PathBuf) {
    // Leaked on purpose: the media directory must outlive the router for
    // the duration of the test process.
    let media_dir: &'static tempfile::TempDir =
        Box::leak(Box::new(tempfile::tempdir().expect("Failed to create temp media dir")));
    let media_root = media_dir.path().to_path_buf();
    let config = test_config(media_root.clone());

    let store: Arc<dyn BlobStore> = Arc::new(LocalStore::new(config.media_root.clone()));

    let state = AppState {
        pool,
        config: Arc::new(config),
        store,
        proposer: None,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(ACTOR_HEADER)])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let app = Router::new()
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
        .with_state(state);

    (app, media_root)
}

/// Send a GET request without an actor header.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a GET request on behalf of the given actor.
pub async fn get_as(app: Router, uri: &str, actor_id: i64) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(ACTOR_HEADER, actor_id.to_string())
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a JSON request on behalf of the given actor.
pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    actor_id: i64,
    body: &serde_json::Value,
) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header(ACTOR_HEADER, actor_id.to_string())
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Response body was not valid JSON")
}

/// Insert a user row and return its id.
pub async fn seed_user(pool: &PgPool, username: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (username) VALUES ($1) RETURNING id")
        .bind(username)
        .fetch_one(pool)
        .await
        .expect("Failed to seed user")
}
