//! HTTP clients against a local axum server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reelforge_core::brand::BrandAssets;
use reelforge_core::frame_data::FrameData;
use reelforge_core::job::JobStatus;
use reelforge_core::request::RenderRequest;
use reelforge_core::timeline::{Slide, Timeline};
use reelforge_core::types::JobId;
use reelforge_render::backoff::BackoffConfig;
use reelforge_render::frames::FrameContent;
use reelforge_render::{FrameDataClient, FrameFetchError, HttpRenderApi, RenderApi, RenderApiError};
use serde_json::json;
use tokio_util::sync::CancellationToken;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

fn request() -> RenderRequest {
    RenderRequest::new(
        Timeline::new(vec![Slide::new("One"), Slide::new("Two")]),
        BrandAssets::named("Acme"),
        "dark",
    )
}

fn fast_backoff(max_attempts: u32) -> BackoffConfig {
    BackoffConfig {
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        multiplier: 2.0,
        max_attempts,
    }
}

// ---------------------------------------------------------------------------
// Render API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_posts_flat_request() {
    let id = JobId::new();
    let router = Router::new().route(
        "/render/create",
        post(move |Json(body): Json<serde_json::Value>| async move {
            assert_eq!(body["brand_name"], "Acme");
            assert_eq!(body["slides"][1]["text"], "Two");
            (
                StatusCode::ACCEPTED,
                Json(json!({ "id": id, "status": "pending" })),
            )
        }),
    );
    let api = HttpRenderApi::new(serve(router).await);

    let created = api.create(&request()).await.unwrap();
    assert_eq!(created.id, id);
    assert_eq!(created.status, JobStatus::Pending);
}

#[tokio::test]
async fn status_ignores_extra_fields() {
    let router = Router::new().route(
        "/render/{id}/status",
        get(|Path(id): Path<String>| async move {
            Json(json!({
                "id": id,
                "status": "done",
                "output_url": "https://cdn/out.mp4",
                "error_message": null,
                "created_at": "2024-01-01T00:00:00Z"
            }))
        }),
    );
    let api = HttpRenderApi::new(serve(router).await);

    let report = api.status(JobId::new()).await.unwrap();
    assert_eq!(report.status, JobStatus::Done);
    assert_eq!(report.output_url.as_deref(), Some("https://cdn/out.mp4"));
}

#[tokio::test]
async fn error_status_keeps_body() {
    let router = Router::new().route(
        "/render/create",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Maximum limit of 15 slides exceeded", "code": "VALIDATION_ERROR" })),
            )
        }),
    );
    let api = HttpRenderApi::new(serve(router).await);

    let err = api.create(&request()).await.unwrap_err();
    assert_matches!(err, RenderApiError::ApiError { status: 400, .. });
    assert_eq!(err.detail(), "Maximum limit of 15 slides exceeded");
}

// ---------------------------------------------------------------------------
// Frame data client
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct FrameServer {
    hits: Arc<AtomicUsize>,
    ready_after: usize,
    body: String,
}

async fn frame_data(State(server): State<FrameServer>, Path(_job_id): Path<String>) -> Response {
    let hit = server.hits.fetch_add(1, Ordering::SeqCst) + 1;
    if hit <= server.ready_after {
        return StatusCode::NOT_FOUND.into_response();
    }
    (
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        server.body.clone(),
    )
        .into_response()
}

async fn frame_server(ready_after: usize, data: &FrameData) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let state = FrameServer {
        hits: Arc::clone(&hits),
        ready_after,
        body: data.to_json().unwrap(),
    };
    let router = Router::new()
        .route("/render/frame-data/{job_id}", get(frame_data))
        .with_state(state);
    (serve(router).await, hits)
}

#[tokio::test]
async fn single_read_maps_404_to_not_found() {
    let id = JobId::new();
    let data = FrameData::from_request(id, &request());
    let (url, _) = frame_server(1, &data).await;
    let client = FrameDataClient::new(url);

    assert_matches!(client.fetch(id).await, Err(FrameFetchError::NotFound { job_id }) if job_id == id);
    assert_eq!(client.fetch(id).await.unwrap(), data);
}

#[tokio::test]
async fn backoff_rides_out_transient_not_found() {
    let id = JobId::new();
    let data = FrameData::from_request(id, &request());
    let (url, hits) = frame_server(3, &data).await;
    let client = FrameDataClient::new(url).with_backoff(fast_backoff(10));

    let fetched = client
        .fetch_with_backoff(id, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(fetched, data);
    assert_eq!(hits.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn backoff_gives_up_after_max_attempts() {
    let id = JobId::new();
    let data = FrameData::from_request(id, &request());
    let (url, hits) = frame_server(usize::MAX, &data).await;
    let client = FrameDataClient::new(url).with_backoff(fast_backoff(3));

    assert_matches!(
        client.fetch_with_backoff(id, &CancellationToken::new()).await,
        Err(FrameFetchError::NotFound { .. })
    );
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn fetch_slide_resolves_logo_frame() {
    let id = JobId::new();
    let data = FrameData::from_request(id, &request());
    let (url, _) = frame_server(0, &data).await;
    let client = FrameDataClient::new(url);

    let frame = client
        .fetch_slide(id, 2, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(frame.frame_count, 3);
    assert_matches!(frame.content, FrameContent::Logo(ref logo) if logo.initials == "AC");
}
