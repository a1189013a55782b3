use std::sync::Arc;

use crate::config::ServerConfig;
use crate::frames::FrameDataStore;
use crate::runner::RenderRunner;
use crate::store::JobStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Render job records.
    pub jobs: Arc<JobStore>,
    /// Frame data snapshots, one per in-flight job.
    pub frames: Arc<dyn FrameDataStore>,
    /// Background renderer invocations.
    pub runner: Arc<RenderRunner>,
}
