//! Timeline model: the ordered slide sequence and its authoring limits.
//!
//! A [`Timeline`] is plain data. It is mutated freely by the editing
//! surface and frozen once it is copied into a render request.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Limits and defaults
// ---------------------------------------------------------------------------

/// Minimum number of authored slides in a timeline.
pub const MIN_SLIDES: usize = 1;

/// Maximum number of authored slides in a timeline.
pub const MAX_SLIDES: usize = 15;

/// Maximum length of a single slide's text, in characters.
pub const MAX_SLIDE_CHARS: usize = 150;

/// Font size applied when a slide does not specify one.
pub const DEFAULT_FONT_SIZE: u32 = 88;

/// Font token applied when a slide does not specify one.
pub const DEFAULT_FONT_TOKEN: &str = "DejaVuSans-Bold.ttf";

/// Transition name applied when a slide does not specify one.
pub const DEFAULT_TRANSITION: &str = "fade";

// ---------------------------------------------------------------------------
// Slide
// ---------------------------------------------------------------------------

/// One unit of on-screen text with its style overrides.
///
/// Deserializes either from a full object or from a bare string, which
/// expands to a slide with default styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SlideInput")]
pub struct Slide {
    pub text: String,
    pub font_size: u32,
    /// Empty means "inherit the theme text color".
    pub text_color: String,
    pub font_family: String,
    pub transition: String,
}

impl Slide {
    /// A slide with default styling.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
            text_color: String::new(),
            font_family: DEFAULT_FONT_TOKEN.to_string(),
            transition: DEFAULT_TRANSITION.to_string(),
        }
    }

    /// Override the text color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.text_color = color.into();
        self
    }

    /// Override the font token.
    pub fn with_font(mut self, token: impl Into<String>) -> Self {
        self.font_family = token.into();
        self
    }

    /// Override the font size.
    pub fn with_font_size(mut self, size: u32) -> Self {
        self.font_size = size;
        self
    }

    /// Length of the slide text in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SlideInput {
    Text(String),
    Styled(StyledSlide),
}

#[derive(Deserialize)]
struct StyledSlide {
    text: String,
    #[serde(default = "default_font_size", alias = "fontSize")]
    font_size: u32,
    #[serde(default, alias = "textColor")]
    text_color: String,
    #[serde(default = "default_font_token", alias = "fontFamily")]
    font_family: String,
    #[serde(default = "default_transition")]
    transition: String,
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_font_token() -> String {
    DEFAULT_FONT_TOKEN.to_string()
}

fn default_transition() -> String {
    DEFAULT_TRANSITION.to_string()
}

impl From<SlideInput> for Slide {
    fn from(input: SlideInput) -> Self {
        match input {
            SlideInput::Text(text) => Slide::new(text),
            SlideInput::Styled(s) => Slide {
                text: s.text,
                font_size: s.font_size,
                text_color: s.text_color,
                font_family: s.font_family,
                transition: s.transition,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Ordered slide sequence plus optional spoken-only outro text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub slides: Vec<Slide>,
    /// Spoken over the logo slide; never shown on screen.
    #[serde(default, alias = "outroVoiceover")]
    pub outro_voiceover: String,
}

impl Timeline {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self {
            slides,
            outro_voiceover: String::new(),
        }
    }

    pub fn with_outro(mut self, outro: impl Into<String>) -> Self {
        self.outro_voiceover = outro.into();
        self
    }

    /// Number of authored slides (N).
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Number of frames including the trailing logo slide (N + 1).
    pub fn frame_count(&self) -> usize {
        self.slides.len() + 1
    }

    /// Enforce slide count and per-slide length limits.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_slide_count(self.slides.len())?;
        for (index, slide) in self.slides.iter().enumerate() {
            validate_slide_text(index, slide)?;
        }
        Ok(())
    }
}

/// Check that `count` lies within `MIN_SLIDES..=MAX_SLIDES`.
pub fn validate_slide_count(count: usize) -> Result<(), CoreError> {
    if count < MIN_SLIDES {
        return Err(CoreError::Validation(
            "A timeline needs at least one slide".into(),
        ));
    }
    if count > MAX_SLIDES {
        return Err(CoreError::Validation(format!(
            "Maximum limit of {MAX_SLIDES} slides exceeded ({count} given)"
        )));
    }
    Ok(())
}

fn validate_slide_text(index: usize, slide: &Slide) -> Result<(), CoreError> {
    let len = slide.char_len();
    if len > MAX_SLIDE_CHARS {
        return Err(CoreError::Validation(format!(
            "Slide {} exceeds the {MAX_SLIDE_CHARS} character limit ({len} characters)",
            index + 1
        )));
    }
    Ok(())
}
