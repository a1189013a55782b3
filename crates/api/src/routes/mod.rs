pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the render route tree.
///
/// Route hierarchy:
///
/// ```text
/// /render/create                   create job (POST, 202)
/// /render/history                  recent jobs, newest first (?limit=&offset=)
/// /render/{id}/status              job status
/// /render/{id}/download            output location (202 while rendering)
/// /render/frame-data/{job_id}      frame data snapshot (no-store, any origin)
/// ```
pub fn render_routes() -> Router<AppState> {
    Router::new()
        .route("/render/create", post(handlers::render::create_render))
        .route("/render/history", get(handlers::render::list_history))
        .route("/render/{id}/status", get(handlers::render::get_status))
        .route("/render/{id}/download", get(handlers::render::download))
        .route(
            "/render/frame-data/{job_id}",
            get(handlers::render::get_frame_data),
        )
}
