//! Theme/brand resolver.
//!
//! Merges per-slide style overrides with theme defaults and appends the
//! synthetic logo slide. The live preview and the frame-data snapshot
//! both go through [`resolve_reel`], and both address frames through
//! [`frame_kind`], so the two can never disagree on what frame `i` shows.

use serde::{Deserialize, Serialize};

use crate::brand::BrandAssets;
use crate::theme::Theme;
use crate::timeline::{Slide, Timeline};

// ---------------------------------------------------------------------------
// Font mapping
// ---------------------------------------------------------------------------

/// Family used for tokens missing from [`FONT_MAP`].
pub const DEFAULT_FONT_FAMILY: &str = "Inter, sans-serif";

/// Font token (as chosen in the editor) to CSS font family.
pub const FONT_MAP: [(&str, &str); 10] = [
    ("DejaVuSans-Bold.ttf", "Inter, sans-serif"),
    ("Montserrat-Bold.ttf", "Montserrat, sans-serif"),
    ("Oswald-Bold.ttf", "Oswald, sans-serif"),
    ("BebasNeue-Regular.ttf", "'Bebas Neue', sans-serif"),
    ("PlayfairDisplay-Bold.ttf", "'Playfair Display', serif"),
    ("Outfit-Bold.ttf", "Outfit, sans-serif"),
    ("SpaceMono-Bold.ttf", "'Space Mono', monospace"),
    ("Cinzel-Bold.ttf", "Cinzel, serif"),
    ("DejaVuSerif.ttf", "serif"),
    ("DejaVuSansMono.ttf", "monospace"),
];

/// Map a font token to its family, falling back to [`DEFAULT_FONT_FAMILY`].
pub fn resolve_font_family(token: &str) -> &'static str {
    FONT_MAP
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, family)| *family)
        .unwrap_or(DEFAULT_FONT_FAMILY)
}

/// Explicit non-empty slide color wins; otherwise the theme text color.
pub fn resolve_color(slide: &Slide, theme: &Theme) -> String {
    let explicit = slide.text_color.trim();
    if explicit.is_empty() {
        theme.text_color.to_string()
    } else {
        explicit.to_string()
    }
}

// ---------------------------------------------------------------------------
// Resolved types
// ---------------------------------------------------------------------------

/// A text slide after fallback merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSlideSpec {
    pub text: String,
    pub font_size_px: u32,
    pub color: String,
    pub font_family: String,
}

/// QR block shown on the logo slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedQr {
    pub url: String,
    /// Edge length, 60% of the logo size.
    pub size: u32,
    pub caption: String,
}

/// The synthetic terminal slide: brand identity instead of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLogoSlide {
    pub brand_name: String,
    pub logo_url: Option<String>,
    /// Shown when there is no logo image.
    pub initials: String,
    pub logo_size: u32,
    pub qr: Option<ResolvedQr>,
    pub text_color: String,
    pub accent_color: String,
}

/// Background watermark shared by every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWatermark {
    pub url: String,
    /// 0.0-1.0.
    pub opacity: f32,
}

/// Fully resolved reel: every text slide, the logo slide and the theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedReel {
    pub slides: Vec<ResolvedSlideSpec>,
    pub logo: ResolvedLogoSlide,
    pub theme: Theme,
    pub watermark: Option<ResolvedWatermark>,
}

/// What a frame index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Text(usize),
    Logo,
}

/// Borrowed view of one frame of a [`ResolvedReel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame<'a> {
    Text(&'a ResolvedSlideSpec),
    Logo(&'a ResolvedLogoSlide),
}

/// Frame addressing: `i < N` is text slide `i`, `N` is the logo slide,
/// anything beyond is out of range.
pub fn frame_kind(index: usize, slide_count: usize) -> Option<FrameKind> {
    match index.cmp(&slide_count) {
        std::cmp::Ordering::Less => Some(FrameKind::Text(index)),
        std::cmp::Ordering::Equal => Some(FrameKind::Logo),
        std::cmp::Ordering::Greater => None,
    }
}

impl ResolvedReel {
    /// N + 1.
    pub fn frame_count(&self) -> usize {
        self.slides.len() + 1
    }

    pub fn frame(&self, index: usize) -> Option<Frame<'_>> {
        match frame_kind(index, self.slides.len())? {
            FrameKind::Text(i) => self.slides.get(i).map(Frame::Text),
            FrameKind::Logo => Some(Frame::Logo(&self.logo)),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

pub fn resolve_slide(slide: &Slide, theme: &Theme) -> ResolvedSlideSpec {
    ResolvedSlideSpec {
        text: slide.text.clone(),
        font_size_px: slide.font_size,
        color: resolve_color(slide, theme),
        font_family: resolve_font_family(&slide.font_family).to_string(),
    }
}

/// 60% of the logo edge. Widened so unvalidated sizes cannot overflow.
fn qr_size(logo_size: u32) -> u32 {
    (u64::from(logo_size) * 3 / 5) as u32
}

pub fn resolve_logo_slide(brand: &BrandAssets, theme: &Theme) -> ResolvedLogoSlide {
    let qr = brand
        .qr_code_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(|url| ResolvedQr {
            url: url.to_string(),
            size: qr_size(brand.logo_size),
            caption: brand.qr_text.clone(),
        });

    ResolvedLogoSlide {
        brand_name: brand.brand_name.clone(),
        logo_url: brand.logo_url.clone().filter(|u| !u.is_empty()),
        initials: brand.initials(),
        logo_size: brand.logo_size,
        qr,
        text_color: theme.text_color.to_string(),
        accent_color: theme.accent_color.to_string(),
    }
}

pub fn resolve_reel(timeline: &Timeline, theme: &Theme, brand: &BrandAssets) -> ResolvedReel {
    let watermark = brand
        .watermark_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(|url| ResolvedWatermark {
            url: url.to_string(),
            opacity: f32::from(brand.watermark_opacity.min(100)) / 100.0,
        });

    ResolvedReel {
        slides: timeline
            .slides
            .iter()
            .map(|s| resolve_slide(s, theme))
            .collect(),
        logo: resolve_logo_slide(brand, theme),
        theme: theme.clone(),
        watermark,
    }
}
