//! Client side of the render pipeline: job submission and polling, and
//! the renderer's frame data reader.

pub mod api;
pub mod backoff;
pub mod coordinator;
pub mod frames;

pub use api::{HttpRenderApi, RenderApi, RenderApiError};
pub use coordinator::{
    CoordinatorState, FailureReason, PollPolicy, RenderCoordinator, RenderError, TrackedJob,
};
pub use frames::{FrameDataClient, FrameFetchError};
