//! Render request: the finalized description handed to the render
//! backend.
//!
//! The wire format is flat snake_case JSON (`brand_name`, `slides`,
//! `theme`, `music_url`, ...). Timeline, brand and audio are flattened
//! into it.

use serde::{Deserialize, Serialize};

use crate::brand::BrandAssets;
use crate::error::CoreError;
use crate::resolve::{resolve_reel, ResolvedReel};
use crate::theme::{theme_or_default, DEFAULT_THEME_ID};
use crate::timeline::Timeline;

/// Music volume applied when the author does not choose one.
pub const DEFAULT_MUSIC_VOLUME: f32 = 0.15;

/// Audio choices for the rendered video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub music_url: Option<String>,
    /// 0.0-1.0.
    #[serde(default = "default_music_volume")]
    pub music_volume: f32,
    /// Offset into the music track, in seconds.
    #[serde(default)]
    pub music_start_time: f32,
    #[serde(default)]
    pub ai_voice_id: Option<String>,
}

fn default_music_volume() -> f32 {
    DEFAULT_MUSIC_VOLUME
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            music_url: None,
            music_volume: DEFAULT_MUSIC_VOLUME,
            music_start_time: 0.0,
            ai_voice_id: None,
        }
    }
}

impl AudioConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&self.music_volume) {
            return Err(CoreError::Validation(format!(
                "Music volume must be between 0.0 and 1.0, got {}",
                self.music_volume
            )));
        }
        if !self.music_start_time.is_finite() || self.music_start_time < 0.0 {
            return Err(CoreError::Validation(
                "Music start time must be a non-negative number of seconds".into(),
            ));
        }
        Ok(())
    }
}

/// Everything needed to render one reel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    #[serde(flatten)]
    pub timeline: Timeline,
    #[serde(flatten)]
    pub brand: BrandAssets,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub script_title: String,
    #[serde(flatten)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub brand_id: Option<String>,
    #[serde(default)]
    pub script_id: Option<String>,
}

fn default_theme() -> String {
    DEFAULT_THEME_ID.to_string()
}

impl RenderRequest {
    pub fn new(timeline: Timeline, brand: BrandAssets, theme: impl Into<String>) -> Self {
        Self {
            timeline,
            brand,
            theme: theme.into(),
            script_title: String::new(),
            audio: AudioConfig::default(),
            brand_id: None,
            script_id: None,
        }
    }

    /// Local constraint check. Runs before any network call.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.timeline.validate()?;
        self.brand.validate()?;
        self.audio.validate()
    }

    /// Resolve styling against the chosen theme (unknown ids fall back).
    pub fn resolve(&self) -> ResolvedReel {
        resolve_reel(&self.timeline, theme_or_default(&self.theme), &self.brand)
    }
}
