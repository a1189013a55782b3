//! Authoring session: the choices a user makes before submitting a render.
//!
//! Choices are made in order (brand, script, theme, audio). A script,
//! theme and audio mix chosen for one brand are meaningless for another,
//! so replacing the brand clears all three.

use crate::brand::BrandAssets;
use crate::error::CoreError;
use crate::request::{AudioConfig, RenderRequest};
use crate::theme::DEFAULT_THEME_ID;
use crate::timeline::Timeline;

#[derive(Debug, Clone, Default)]
pub struct ReelSession {
    brand: Option<BrandAssets>,
    brand_id: Option<String>,
    script: Option<SessionScript>,
    theme_id: Option<String>,
    audio: Option<AudioConfig>,
}

#[derive(Debug, Clone)]
struct SessionScript {
    id: Option<String>,
    title: String,
    timeline: Timeline,
}

impl ReelSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a brand. Selecting a different brand discards the script,
    /// theme and audio choices; re-selecting the same brand keeps them.
    pub fn set_brand(&mut self, brand: BrandAssets, brand_id: Option<String>) {
        let changed = self.brand.as_ref() != Some(&brand) || self.brand_id != brand_id;
        if changed {
            self.script = None;
            self.theme_id = None;
            self.audio = None;
        }
        self.brand = Some(brand);
        self.brand_id = brand_id;
    }

    pub fn set_script(
        &mut self,
        title: impl Into<String>,
        timeline: Timeline,
        script_id: Option<String>,
    ) {
        self.script = Some(SessionScript {
            id: script_id,
            title: title.into(),
            timeline,
        });
    }

    pub fn set_theme(&mut self, theme_id: impl Into<String>) {
        self.theme_id = Some(theme_id.into());
    }

    pub fn set_audio(&mut self, audio: AudioConfig) {
        self.audio = Some(audio);
    }

    pub fn brand(&self) -> Option<&BrandAssets> {
        self.brand.as_ref()
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.script.as_ref().map(|s| &s.timeline)
    }

    /// Mutable access for slide editing after generation.
    pub fn timeline_mut(&mut self) -> Option<&mut Timeline> {
        self.script.as_mut().map(|s| &mut s.timeline)
    }

    pub fn theme_id(&self) -> Option<&str> {
        self.theme_id.as_deref()
    }

    pub fn audio(&self) -> Option<&AudioConfig> {
        self.audio.as_ref()
    }

    /// Freeze the current choices into a validated request. Theme and
    /// audio fall back to their defaults when not chosen.
    pub fn to_render_request(&self) -> Result<RenderRequest, CoreError> {
        let brand = self
            .brand
            .clone()
            .ok_or_else(|| CoreError::Validation("Select a brand first".into()))?;
        let script = self
            .script
            .as_ref()
            .ok_or_else(|| CoreError::Validation("Generate a script first".into()))?;

        let theme = self.theme_id.as_deref().unwrap_or(DEFAULT_THEME_ID);
        let mut request = RenderRequest::new(script.timeline.clone(), brand, theme);
        request.script_title = script.title.clone();
        request.audio = self.audio.clone().unwrap_or_default();
        request.brand_id = self.brand_id.clone();
        request.script_id = script.id.clone();

        request.validate()?;
        Ok(request)
    }
}
