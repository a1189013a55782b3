//! In-memory render job registry.
//!
//! Finished jobs stay until the retention task evicts them. Every status change goes
//! through [`RenderJob::advance`], so a job can never move backwards or
//! leave a terminal state.

use std::collections::HashMap;

use reelforge_core::error::CoreError;
use reelforge_core::job::{JobStatus, RenderJob};
use reelforge_core::types::{JobId, Timestamp};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, RenderJob>>,
}

fn not_found(id: JobId) -> CoreError {
    CoreError::NotFound {
        entity: "RenderJob",
        id: id.to_string(),
    }
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh `pending` job.
    pub async fn create(&self) -> RenderJob {
        let job = RenderJob::pending(JobId::new());
        self.jobs.write().await.insert(job.id, job.clone());
        job
    }

    pub async fn get(&self, id: JobId) -> Result<RenderJob, CoreError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    pub async fn mark_processing(&self, id: JobId) -> Result<RenderJob, CoreError> {
        self.update(id, |job| job.advance(JobStatus::Processing)).await
    }

    pub async fn complete(&self, id: JobId, output_url: String) -> Result<RenderJob, CoreError> {
        self.update(id, |job| job.complete(output_url)).await
    }

    pub async fn fail(&self, id: JobId, reason: String) -> Result<RenderJob, CoreError> {
        self.update(id, |job| job.fail(reason)).await
    }

    /// Jobs newest first, skipping `offset` and returning at most `limit`.
    pub async fn recent(&self, limit: usize, offset: usize) -> Vec<RenderJob> {
        let mut jobs: Vec<RenderJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.into_iter().skip(offset).take(limit).collect()
    }

    /// Drop terminal jobs that completed at or before `cutoff`. Pending and
    /// processing jobs are never removed. Returns the number removed.
    pub async fn delete_finished_before(&self, cutoff: Timestamp) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| !job.completed_at.is_some_and(|done| done <= cutoff));
        before - jobs.len()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    async fn update(
        &self,
        id: JobId,
        apply: impl FnOnce(&mut RenderJob) -> Result<(), CoreError>,
    ) -> Result<RenderJob, CoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or_else(|| not_found(id))?;
        apply(job)?;
        Ok(job.clone())
    }
}
