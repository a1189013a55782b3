//! Periodic eviction of finished render jobs.
//!
//! Once a job is `done` or `failed` its record is only kept long enough
//! for clients to read the outcome. Frame data is already discarded by the
//! runner; this loop removes the job record itself.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::store::JobStore;

/// Run the retention loop until `cancel` is triggered.
///
/// Every `sweep_every`, terminal jobs that completed more than `retention`
/// ago are removed from `store`.
pub async fn run(
    store: Arc<JobStore>,
    retention: Duration,
    sweep_every: Duration,
    cancel: CancellationToken,
) {
    let retention = match chrono::Duration::from_std(retention) {
        Ok(retention) => retention,
        Err(e) => {
            tracing::error!(error = %e, "Job retention period out of range, eviction disabled");
            return;
        }
    };

    tracing::info!(
        retention_secs = retention.num_seconds(),
        interval_secs = sweep_every.as_secs(),
        "Job retention task started"
    );

    let mut interval = tokio::time::interval(sweep_every.max(Duration::from_millis(1)));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job retention task stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = chrono::Utc::now() - retention;
                let evicted = store.delete_finished_before(cutoff).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Job retention: evicted finished jobs");
                } else {
                    tracing::debug!("Job retention: nothing to evict");
                }
            }
        }
    }
}
