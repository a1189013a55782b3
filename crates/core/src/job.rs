//! Render job record and its monotonic status machine.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

/// Server-side render job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// `done` and `failed` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Statuses reachable from `self` in one step.
    pub fn valid_transitions(self) -> &'static [JobStatus] {
        match self {
            // Frame data storage can fail a job before rendering starts.
            Self::Pending => &[Self::Processing, Self::Failed],
            Self::Processing => &[Self::Done, Self::Failed],
            Self::Done | Self::Failed => &[],
        }
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One render job as tracked by the render backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub id: JobId,
    pub status: JobStatus,
    pub output_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl RenderJob {
    /// A fresh job in `pending`.
    pub fn pending(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            output_url: None,
            error_message: None,
            created_at: chrono::Utc::now(),
            completed_at: None,
        }
    }

    /// Move to `next`, rejecting backward or post-terminal transitions.
    pub fn advance(&mut self, next: JobStatus) -> Result<(), CoreError> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::Conflict(format!(
                "Render job {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    pub fn complete(&mut self, output_url: impl Into<String>) -> Result<(), CoreError> {
        self.advance(JobStatus::Done)?;
        self.output_url = Some(output_url.into());
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), CoreError> {
        self.advance(JobStatus::Failed)?;
        self.error_message = Some(reason.into());
        Ok(())
    }
}
