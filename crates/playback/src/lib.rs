//! Live preview playback: per-slide timing, optionally synchronized to
//! synthesized narration.

pub mod config;
pub mod policy;
pub mod scheduler;
pub mod speech;

pub use config::PlaybackConfig;
pub use policy::{HoldPolicy, Phase, PreviewScript};
pub use scheduler::{
    Command, PlaybackError, PlaybackEvent, PreviewHandle, PreviewScheduler, SpeechEngine,
};
