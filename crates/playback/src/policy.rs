//! Per-slide phases and hold policies.

use std::time::Duration;

use reelforge_core::request::RenderRequest;
use reelforge_core::resolve::{Frame, ResolvedReel};
use serde::Serialize;

use crate::config::PlaybackConfig;

/// Lifecycle of the slide currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Entering,
    Holding,
    Exiting,
}

/// How long a slide stays in [`Phase::Holding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPolicy {
    /// Leave the hold after a fixed duration.
    Fixed(Duration),
    /// Leave the hold when narration ends, or at `ceiling`, whichever
    /// comes first.
    SpeechSynced { ceiling: Duration },
}

/// Index that follows `index` in a loop of `frame_count` frames.
pub fn next_index(index: usize, frame_count: usize) -> usize {
    (index + 1) % frame_count.max(1)
}

/// What the preview plays: the resolved reel plus narration settings.
#[derive(Debug, Clone)]
pub struct PreviewScript {
    pub reel: ResolvedReel,
    /// Spoken over the logo slide when non-empty.
    pub outro_voiceover: String,
    /// Narration is enabled only when a voice is chosen.
    pub voice_id: Option<String>,
}

impl PreviewScript {
    pub fn new(reel: ResolvedReel) -> Self {
        Self {
            reel,
            outro_voiceover: String::new(),
            voice_id: None,
        }
    }

    pub fn from_request(request: &RenderRequest) -> Self {
        Self {
            reel: request.resolve(),
            outro_voiceover: request.timeline.outro_voiceover.clone(),
            voice_id: request.audio.ai_voice_id.clone(),
        }
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    pub fn with_outro(mut self, outro: impl Into<String>) -> Self {
        self.outro_voiceover = outro.into();
        self
    }

    /// N + 1.
    pub fn frame_count(&self) -> usize {
        self.reel.frame_count()
    }

    /// Text narrated over frame `index`, if any. Text slides speak their
    /// own text; the logo slide speaks the outro.
    pub fn speech_text(&self, index: usize) -> Option<&str> {
        self.voice_id.as_ref()?;
        let text = match self.reel.frame(index)? {
            Frame::Text(slide) => slide.text.as_str(),
            Frame::Logo(_) => self.outro_voiceover.as_str(),
        };
        let text = text.trim();
        (!text.is_empty()).then_some(text)
    }

    pub fn hold_policy(&self, index: usize, config: &PlaybackConfig) -> HoldPolicy {
        match self.speech_text(index) {
            Some(_) => HoldPolicy::SpeechSynced {
                ceiling: config.speech_ceiling,
            },
            None => HoldPolicy::Fixed(config.fixed_hold),
        }
    }
}

#[cfg(test)]
mod tests {
    use reelforge_core::brand::BrandAssets;
    use reelforge_core::timeline::{Slide, Timeline};

    use super::*;

    fn script() -> PreviewScript {
        let request = RenderRequest::new(
            Timeline::new(vec![Slide::new("Hello"), Slide::new("World")]),
            BrandAssets::named("Acme"),
            "dark",
        );
        PreviewScript::from_request(&request)
    }

    #[test]
    fn index_wraps_after_logo_slide() {
        assert_eq!(next_index(0, 3), 1);
        assert_eq!(next_index(2, 3), 0);
    }

    #[test]
    fn without_voice_every_hold_is_fixed() {
        let config = PlaybackConfig::default();
        let script = script();
        for i in 0..script.frame_count() {
            assert_eq!(
                script.hold_policy(i, &config),
                HoldPolicy::Fixed(Duration::from_millis(4000))
            );
        }
    }

    #[test]
    fn voice_narrates_text_slides() {
        let script = script().with_voice("v1");
        assert_eq!(script.speech_text(1), Some("World"));
        assert_eq!(
            script.hold_policy(0, &PlaybackConfig::default()),
            HoldPolicy::SpeechSynced {
                ceiling: Duration::from_millis(12000)
            }
        );
    }

    #[test]
    fn logo_slide_speaks_outro_only_when_set() {
        let script = script().with_voice("v1");
        assert_eq!(script.speech_text(2), None);

        let script = script.with_outro("See you soon");
        assert_eq!(script.speech_text(2), Some("See you soon"));
    }

    #[test]
    fn out_of_range_index_has_no_speech() {
        assert_eq!(script().with_voice("v1").speech_text(3), None);
    }
}
