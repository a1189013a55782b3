//! Router assembly for the render backend.
//!
//! The binary and the integration tests both go through
//! [`build_app_router`], so tests see the same layers as production.

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Build the ReelForge [`Router`]: health, the render job routes and the
/// middleware shared by both.
///
/// Layers run outermost first on the way in: CORS, request id, tracing,
/// request id echo, timeout, then panic recovery around the handlers. The
/// frame data route sets its own `Access-Control-Allow-Origin: *` on top of
/// this, since the renderer's pages are not a configured origin.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = build_cors_layer(config);
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .merge(routes::render_routes())
        // A panicking handler becomes a 500 instead of a dropped connection.
        .layer(CatchPanicLayer::new())
        // Bounds request handling only. Renders run on the runner's tracker.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Echo x-request-id so the editor UI can quote it in bug reports.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // One INFO span per request, carrying the request id.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // Browser editor origins from CORS_ORIGINS.
        .layer(cors)
        .with_state(state)
}

/// CORS for the browser editor: GET and POST with a JSON body, from the
/// origins in `CORS_ORIGINS`.
///
/// Panics if an origin does not parse as a header value. Only called while
/// the server starts.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}
