//! Renderer-side frame data client.
//!
//! The screenshot renderer loads one page per frame and each page asks
//! for `GET /render/frame-data/{job_id}`. A 404 is a normal transient
//! state right after job creation, so reads retry with backoff.

use std::time::Duration;

use reelforge_core::frame_data::FrameData;
use reelforge_core::resolve::{Frame, ResolvedLogoSlide, ResolvedSlideSpec, ResolvedWatermark};
use reelforge_core::theme::Theme;
use reelforge_core::types::JobId;
use tokio_util::sync::CancellationToken;

use crate::backoff::{next_delay, BackoffConfig};

#[derive(Debug, thiserror::Error)]
pub enum FrameFetchError {
    /// No snapshot stored for the job (yet).
    #[error("Frame data not found for job {job_id}")]
    NotFound { job_id: JobId },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Frame data API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Frame {index} out of range (job has {frame_count} frames)")]
    OutOfRange { index: usize, frame_count: usize },

    #[error("Frame data fetch cancelled")]
    Cancelled,
}

/// What one captured frame shows, with the reel-wide styling it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideFrame {
    pub index: usize,
    pub frame_count: usize,
    pub theme: Theme,
    pub watermark: Option<ResolvedWatermark>,
    pub content: FrameContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameContent {
    Text(ResolvedSlideSpec),
    Logo(ResolvedLogoSlide),
}

/// Resolve frame `index` of a snapshot.
pub fn slide_frame(data: &FrameData, index: usize) -> Result<SlideFrame, FrameFetchError> {
    let content = match data.frame(index) {
        Some(Frame::Text(spec)) => FrameContent::Text(spec.clone()),
        Some(Frame::Logo(logo)) => FrameContent::Logo(logo.clone()),
        None => {
            return Err(FrameFetchError::OutOfRange {
                index,
                frame_count: data.frame_count,
            })
        }
    };
    Ok(SlideFrame {
        index,
        frame_count: data.frame_count,
        theme: data.reel.theme.clone(),
        watermark: data.reel.watermark.clone(),
        content,
    })
}

pub struct FrameDataClient {
    client: reqwest::Client,
    api_url: String,
    backoff: BackoffConfig,
}

impl FrameDataClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            backoff: BackoffConfig::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Single read. A 404 maps to [`FrameFetchError::NotFound`].
    pub async fn fetch(&self, job_id: JobId) -> Result<FrameData, FrameFetchError> {
        let response = self
            .client
            .get(format!("{}/render/frame-data/{job_id}", self.api_url))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FrameFetchError::NotFound { job_id });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FrameFetchError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<FrameData>().await?)
    }

    /// Read, retrying only on not-found. Returns the last not-found once
    /// the attempts are exhausted; any other error is returned at once.
    pub async fn fetch_with_backoff(
        &self,
        job_id: JobId,
        cancel: &CancellationToken,
    ) -> Result<FrameData, FrameFetchError> {
        let mut delay = self.backoff.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.fetch(job_id).await {
                Err(FrameFetchError::NotFound { .. }) if attempt < self.backoff.max_attempts => {
                    tracing::debug!(
                        %job_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Frame data not ready, retrying",
                    );
                }
                other => return other,
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(FrameFetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            delay = next_delay(delay, &self.backoff);
        }
    }

    /// Fetch (with backoff) and resolve one frame.
    pub async fn fetch_slide(
        &self,
        job_id: JobId,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<SlideFrame, FrameFetchError> {
        let data = self.fetch_with_backoff(job_id, cancel).await?;
        slide_frame(&data, index)
    }

    /// Upper bound on the time spent sleeping by [`Self::fetch_with_backoff`].
    pub fn max_wait(&self) -> Duration {
        let mut delay = self.backoff.initial_delay;
        let mut total = Duration::ZERO;
        for _ in 1..self.backoff.max_attempts {
            total += delay;
            delay = next_delay(delay, &self.backoff);
        }
        total
    }
}
