//! Background render runner.
//!
//! After a job is created the runner marks it `processing`, hands the
//! frame data URL to the external renderer and records the outcome. The
//! frame data snapshot is discarded once the job is terminal, whatever
//! the outcome.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reelforge_core::types::JobId;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::frames::FrameDataStore;
use crate::store::JobStore;

/// Lines of renderer stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Everything the renderer needs to capture one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderInvocation {
    pub job_id: JobId,
    pub frame_data_url: String,
    pub frame_count: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Renderer not configured")]
    NotConfigured,

    #[error("Renderer could not be started: {0}")]
    Spawn(std::io::Error),

    #[error("Renderer failed (exit code {exit_code:?}): {stderr}")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Renderer finished without reporting an output location")]
    NoOutput,

    #[error("Render cancelled: server shutting down")]
    Cancelled,
}

/// Screenshot-and-encode renderer. Returns the output location.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, invocation: &RenderInvocation) -> Result<String, RendererError>;
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

/// Runs an external program as
/// `<program> [args...] <job_id> <frame_data_url> <frame_count>`.
///
/// The last non-empty stdout line is the output location.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line. `None` when blank.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, invocation: &RenderInvocation) -> Result<String, RendererError> {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(invocation.job_id.to_string())
            .arg(&invocation.frame_data_url)
            .arg(invocation.frame_count.to_string())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(RendererError::Spawn)?;

        if !output.status.success() {
            return Err(RendererError::Failed {
                exit_code: output.status.code(),
                stderr: tail_lines(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES),
            });
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(str::to_string)
            .ok_or(RendererError::NoOutput)
    }
}

/// Stand-in used when no renderer command is configured.
pub struct UnconfiguredRenderer;

#[async_trait]
impl Renderer for UnconfiguredRenderer {
    async fn render(&self, _invocation: &RenderInvocation) -> Result<String, RendererError> {
        Err(RendererError::NotConfigured)
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub struct RenderRunner {
    jobs: Arc<JobStore>,
    frames: Arc<dyn FrameDataStore>,
    renderer: Arc<dyn Renderer>,
    public_base_url: String,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl RenderRunner {
    pub fn new(
        jobs: Arc<JobStore>,
        frames: Arc<dyn FrameDataStore>,
        renderer: Arc<dyn Renderer>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            jobs,
            frames,
            renderer,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// URL the renderer reads the snapshot from.
    pub fn frame_data_url(&self, job_id: JobId) -> String {
        format!("{}/render/frame-data/{job_id}", self.public_base_url)
    }

    /// Run the job in the background.
    pub fn spawn(self: &Arc<Self>, job_id: JobId, frame_count: usize) {
        let runner = Arc::clone(self);
        self.tracker
            .spawn(async move { runner.run(job_id, frame_count).await });
    }

    pub async fn run(&self, job_id: JobId, frame_count: usize) {
        if let Err(e) = self.jobs.mark_processing(job_id).await {
            tracing::warn!(%job_id, error = %e, "Render job cannot start");
            return;
        }

        let invocation = RenderInvocation {
            job_id,
            frame_data_url: self.frame_data_url(job_id),
            frame_count,
        };
        tracing::info!(%job_id, frame_count, "Render started");

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(RendererError::Cancelled),
            result = self.renderer.render(&invocation) => result,
        };

        let recorded = match outcome {
            Ok(output_url) => {
                tracing::info!(%job_id, output_url = %output_url, "Render finished");
                self.jobs.complete(job_id, output_url).await
            }
            Err(e) => {
                tracing::warn!(%job_id, error = %e, "Render failed");
                self.jobs.fail(job_id, e.to_string()).await
            }
        };
        if let Err(e) = recorded {
            tracing::error!(%job_id, error = %e, "Failed to record render outcome");
        }

        if let Err(e) = self.frames.remove(job_id).await {
            tracing::warn!(%job_id, error = %e, "Failed to discard frame data");
        }
    }

    /// Cancel in-flight renders and wait up to `timeout` for them to be
    /// recorded. Returns `false` if some were still running.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        self.cancel.cancel();
        tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok()
    }
}
