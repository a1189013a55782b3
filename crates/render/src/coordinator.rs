//! Render job coordinator: submit, then poll until terminal.
//!
//! Each tracked job gets its own polling task with exactly one status
//! request outstanding at a time; the next poll is scheduled only after
//! the previous answer (or failure) has been observed. Job state is
//! published on a [`watch`] channel and never moves backwards.

use std::sync::Arc;
use std::time::Duration;

use reelforge_core::error::CoreError;
use reelforge_core::job::JobStatus;
use reelforge_core::request::RenderRequest;
use reelforge_core::types::JobId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{CreatedJob, JobStatusReport, RenderApi, RenderApiError};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Status polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before every poll, including the first.
    pub interval: Duration,
    /// Non-terminal answers tolerated before the job is declared timed out.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            max_attempts: 100,
        }
    }
}

impl PollPolicy {
    /// Total time a job may stay non-terminal.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Why a job ended in `failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Still non-terminal when the poll ceiling ran out.
    Timeout { after: Duration },
    /// A status poll could not be completed.
    ConnectionLost(String),
    /// The backend refused to create the job.
    Rejected(String),
    /// The backend reported the render as failed.
    Backend(String),
}

impl FailureReason {
    pub fn message(&self) -> String {
        match self {
            Self::Timeout { after } => {
                format!("Render timed out after {}", human_duration(*after))
            }
            Self::ConnectionLost(_) => "Lost connection while rendering.".to_string(),
            Self::Rejected(detail) => format!("Failed to start render: {detail}"),
            Self::Backend(detail) if detail.trim().is_empty() => "Render failed".to_string(),
            Self::Backend(detail) => detail.clone(),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

fn human_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match secs {
        60 => "1 minute".to_string(),
        s if s > 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{s} seconds"),
    }
}

/// Client-side view of one render job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Pending,
    Processing,
    Done { output_url: Option<String> },
    Failed { reason: FailureReason },
}

impl CoordinatorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Failed { .. })
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Pending => 1,
            Self::Processing => 2,
            Self::Done { .. } | Self::Failed { .. } => 3,
        }
    }

    fn from_report(report: JobStatusReport) -> Self {
        match report.status {
            JobStatus::Pending => Self::Pending,
            JobStatus::Processing => Self::Processing,
            JobStatus::Done => Self::Done {
                output_url: report.output_url,
            },
            JobStatus::Failed => Self::Failed {
                reason: FailureReason::Backend(report.error_message.unwrap_or_default()),
            },
        }
    }

    fn from_status(status: JobStatus) -> Self {
        Self::from_report(JobStatusReport {
            status,
            output_url: None,
            error_message: None,
        })
    }
}

/// Publish `next` unless it would move the job backwards or out of a
/// terminal state.
fn advance(state: &watch::Sender<CoordinatorState>, next: CoordinatorState) -> bool {
    state.send_if_modified(|current| {
        if next.rank() > current.rank() {
            *current = next;
            true
        } else {
            false
        }
    })
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("Failed to start render: {}", .0.detail())]
    Submission(#[source] RenderApiError),

    #[error("Render timed out after {attempts} status checks")]
    PollTimeout { attempts: u32, after: Duration },

    #[error("Lost connection while rendering: {0}")]
    PollTransport(String),

    #[error("Render failed: {0}")]
    Backend(String),

    #[error("Render tracking was cancelled")]
    Cancelled,
}

impl RenderError {
    /// The terminal reason a UI should show for this error, if it ends
    /// the job.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Validation(_) | Self::Cancelled => None,
            Self::Submission(e) => Some(FailureReason::Rejected(e.detail())),
            Self::PollTimeout { after, .. } => Some(FailureReason::Timeout { after: *after }),
            Self::PollTransport(detail) => Some(FailureReason::ConnectionLost(detail.clone())),
            Self::Backend(detail) => Some(FailureReason::Backend(detail.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

pub struct RenderCoordinator {
    api: Arc<dyn RenderApi>,
    policy: PollPolicy,
    /// Parent of every per-job token; cancelled on shutdown.
    cancel: CancellationToken,
}

/// A job being polled in the background.
#[derive(Debug)]
pub struct TrackedJob {
    id: JobId,
    state: watch::Receiver<CoordinatorState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    policy: PollPolicy,
}

impl RenderCoordinator {
    pub fn new(api: Arc<dyn RenderApi>, policy: PollPolicy) -> Self {
        Self {
            api,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Validate locally, then create the job. An invalid request never
    /// reaches the network.
    pub async fn submit(&self, request: &RenderRequest) -> Result<CreatedJob, RenderError> {
        request.validate()?;
        let created = self
            .api
            .create(request)
            .await
            .map_err(RenderError::Submission)?;
        tracing::info!(job_id = %created.id, status = %created.status, "Render job submitted");
        Ok(created)
    }

    /// Submit and start tracking in one step.
    pub async fn start(&self, request: &RenderRequest) -> Result<TrackedJob, RenderError> {
        let created = self.submit(request).await?;
        Ok(self.track(created.id, created.status))
    }

    /// Start polling an existing job whose last known status is `status`.
    pub fn track(&self, id: JobId, status: JobStatus) -> TrackedJob {
        let (tx, rx) = watch::channel(CoordinatorState::Idle);
        advance(&tx, CoordinatorState::from_status(status));

        let cancel = self.cancel.child_token();
        let task = tokio::spawn(poll_job(
            Arc::clone(&self.api),
            id,
            self.policy,
            tx,
            cancel.clone(),
        ));

        TrackedJob {
            id,
            state: rx,
            cancel,
            task,
            policy: self.policy,
        }
    }

    /// Stop every job's polling loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn poll_job(
    api: Arc<dyn RenderApi>,
    id: JobId,
    policy: PollPolicy,
    state: watch::Sender<CoordinatorState>,
    cancel: CancellationToken,
) {
    if state.borrow().is_terminal() {
        return;
    }

    for attempt in 1..=policy.max_attempts {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(job_id = %id, attempt, "Render tracking cancelled");
                return;
            }
            _ = tokio::time::sleep(policy.interval) => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(job_id = %id, attempt, "Render tracking cancelled");
                return;
            }
            result = api.status(id) => result,
        };

        match result {
            Ok(report) => {
                tracing::debug!(job_id = %id, attempt, status = %report.status, "Polled render job");
                advance(&state, CoordinatorState::from_report(report));
                if let CoordinatorState::Done { output_url } = &*state.borrow() {
                    tracing::info!(job_id = %id, attempt, output_url = ?output_url, "Render job done");
                }
                if state.borrow().is_terminal() {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %id, attempt, error = %e, "Render status poll failed");
                advance(
                    &state,
                    CoordinatorState::Failed {
                        reason: FailureReason::ConnectionLost(e.detail()),
                    },
                );
                return;
            }
        }
    }

    tracing::warn!(
        job_id = %id,
        attempts = policy.max_attempts,
        "Render job still running at poll ceiling",
    );
    advance(
        &state,
        CoordinatorState::Failed {
            reason: FailureReason::Timeout {
                after: policy.ceiling(),
            },
        },
    );
}

impl TrackedJob {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Latest published state.
    pub fn state(&self) -> CoordinatorState {
        self.state.borrow().clone()
    }

    /// Independent receiver for state changes.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.clone()
    }

    /// Stop polling this job permanently. The state stays at whatever was
    /// last observed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the job is terminal or tracking stops, returning the
    /// final observed state.
    pub async fn wait(&mut self) -> CoordinatorState {
        loop {
            let current = self.state.borrow_and_update().clone();
            if current.is_terminal() {
                return current;
            }
            if self.state.changed().await.is_err() {
                return self.state.borrow().clone();
            }
        }
    }

    /// Wait for the outcome and turn it into a `Result`.
    pub async fn finish(mut self) -> Result<Option<String>, RenderError> {
        match self.wait().await {
            CoordinatorState::Done { output_url } => Ok(output_url),
            CoordinatorState::Failed { reason } => Err(match reason {
                FailureReason::Timeout { after } => RenderError::PollTimeout {
                    attempts: self.policy.max_attempts,
                    after,
                },
                FailureReason::ConnectionLost(detail) => RenderError::PollTransport(detail),
                FailureReason::Rejected(detail) | FailureReason::Backend(detail) => {
                    RenderError::Backend(detail)
                }
            }),
            _ => Err(RenderError::Cancelled),
        }
    }
}
