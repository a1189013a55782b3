//! Handlers for render jobs and their frame data.

use axum::extract::{Path, Query, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reelforge_core::error::CoreError;
use reelforge_core::frame_data::FrameData;
use reelforge_core::job::{JobStatus, RenderJob};
use reelforge_core::request::RenderRequest;
use reelforge_core::types::JobId;

use crate::error::{AppError, AppResult};
use crate::query::{PaginationParams, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
use crate::response::{DownloadPendingResponse, DownloadResponse, JobCreatedResponse};
use crate::state::AppState;

/// Headers sent with every frame data read, found or not. The renderer's
/// pages are served from another origin and must never see a cached 404.
const FRAME_DATA_HEADERS: [(HeaderName, &str); 2] = [
    (CACHE_CONTROL, "no-store"),
    (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
];

fn parse_job_id(raw: &str) -> AppResult<JobId> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid job id: '{raw}'")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /render/create
///
/// Validate the request, register a `pending` job, write its frame data
/// snapshot and start rendering in the background.
pub async fn create_render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> AppResult<impl IntoResponse> {
    request.validate()?;

    let job = state.jobs.create().await;
    let data = FrameData::from_request(job.id, &request);

    if let Err(e) = state.frames.put(job.id, &data).await {
        if let Err(fail_err) = state
            .jobs
            .fail(job.id, format!("Failed to store frame data: {e}"))
            .await
        {
            tracing::error!(job_id = %job.id, error = %fail_err, "Failed to mark job failed");
        }
        return Err(e.into());
    }

    state.runner.spawn(job.id, data.frame_count);

    tracing::info!(
        job_id = %job.id,
        frame_count = data.frame_count,
        theme = %data.reel.theme.id,
        "Render job created",
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(JobCreatedResponse {
            id: job.id,
            status: job.status,
        }),
    ))
}

/// GET /render/{id}/status
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<RenderJob>> {
    let job_id = parse_job_id(&id)?;
    Ok(Json(state.jobs.get(job_id).await?))
}

/// GET /render/history
///
/// Known jobs, newest first. Finished jobs drop out of the list once the
/// retention task evicts them.
pub async fn list_history(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Json<Vec<RenderJob>> {
    let limit = params.limit_or(DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT);
    Json(state.jobs.recent(limit, params.offset()).await)
}

/// GET /render/frame-data/{job_id}
///
/// Returns the stored snapshot byte for byte, or 404 while it is not
/// written yet (or already discarded).
pub async fn get_frame_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    (FRAME_DATA_HEADERS, load_frame_data(&state, &id).await)
}

async fn load_frame_data(state: &AppState, raw_id: &str) -> AppResult<Response> {
    let job_id = parse_job_id(raw_id)?;
    let json = state
        .frames
        .get(job_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "FrameData",
            id: job_id.to_string(),
        })?;

    Ok(([(CONTENT_TYPE, "application/json")], json).into_response())
}

/// GET /render/{id}/download
///
/// `202` until the job is done, then the output location. A failed job
/// has nothing to download and answers `409`.
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let job = state.jobs.get(parse_job_id(&id)?).await?;

    match job.status {
        JobStatus::Done => {
            let download_url = job.output_url.ok_or_else(|| {
                AppError::InternalError(format!("Job {} is done without an output URL", job.id))
            })?;
            Ok(Json(DownloadResponse { download_url }).into_response())
        }
        JobStatus::Failed => Err(CoreError::Conflict(format!(
            "Render failed: {}",
            job.error_message.as_deref().unwrap_or("unknown error")
        ))
        .into()),
        JobStatus::Pending | JobStatus::Processing => Ok((
            StatusCode::ACCEPTED,
            Json(DownloadPendingResponse {
                id: job.id,
                status: job.status,
            }),
        )
            .into_response()),
    }
}
