//! Response bodies for the render endpoints.
//!
//! Bodies are bare JSON objects (no envelope) so the render coordinator
//! and the screenshot renderer can read them directly.

use reelforge_core::job::JobStatus;
use reelforge_core::types::JobId;
use serde::Serialize;

/// `202 Accepted` body for `POST /render/create`.
#[derive(Debug, Serialize)]
pub struct JobCreatedResponse {
    pub id: JobId,
    pub status: JobStatus,
}

/// Body for a finished `GET /render/{id}/download`.
#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub download_url: String,
}

/// `202 Accepted` body while the output is not ready yet.
#[derive(Debug, Serialize)]
pub struct DownloadPendingResponse {
    pub id: JobId,
    pub status: JobStatus,
}
