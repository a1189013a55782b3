//! Brand assets carried by the trailing logo slide.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Watermark opacity applied when the author does not choose one (percent).
pub const DEFAULT_WATERMARK_OPACITY: u8 = 18;

/// Logo edge length applied when the author does not choose one (px at
/// preview scale).
pub const DEFAULT_LOGO_SIZE: u32 = 120;

/// Largest accepted logo edge length (px at preview scale).
pub const MAX_LOGO_SIZE: u32 = 400;

/// Where the logo sits on watermark-bearing frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoPosition {
    TopLeft,
    TopCenter,
    TopRight,
    Center,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

/// Immutable brand configuration for one render request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandAssets {
    pub brand_name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub watermark_url: Option<String>,
    /// 0-100.
    #[serde(default = "default_opacity")]
    pub watermark_opacity: u8,
    #[serde(default)]
    pub logo_position: LogoPosition,
    #[serde(default = "default_logo_size")]
    pub logo_size: u32,
    #[serde(default)]
    pub qr_code_url: Option<String>,
    #[serde(default)]
    pub qr_text: String,
    #[serde(default)]
    pub website_url: Option<String>,
}

fn default_opacity() -> u8 {
    DEFAULT_WATERMARK_OPACITY
}

fn default_logo_size() -> u32 {
    DEFAULT_LOGO_SIZE
}

impl BrandAssets {
    /// Brand with only a name; every asset left at its default.
    pub fn named(brand_name: impl Into<String>) -> Self {
        Self {
            brand_name: brand_name.into(),
            logo_url: None,
            watermark_url: None,
            watermark_opacity: DEFAULT_WATERMARK_OPACITY,
            logo_position: LogoPosition::default(),
            logo_size: DEFAULT_LOGO_SIZE,
            qr_code_url: None,
            qr_text: String::new(),
            website_url: None,
        }
    }

    /// Up to two leading characters of the brand name, upper-cased. Shown
    /// in place of a logo image when none was uploaded.
    pub fn initials(&self) -> String {
        self.brand_name
            .trim()
            .chars()
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.brand_name.trim().is_empty() {
            return Err(CoreError::Validation("Brand name is required".into()));
        }
        if self.watermark_opacity > 100 {
            return Err(CoreError::Validation(format!(
                "Watermark opacity must be between 0 and 100, got {}",
                self.watermark_opacity
            )));
        }
        if self.logo_size == 0 || self.logo_size > MAX_LOGO_SIZE {
            return Err(CoreError::Validation(format!(
                "Logo size must be between 1 and {MAX_LOGO_SIZE} px, got {}",
                self.logo_size
            )));
        }
        Ok(())
    }
}
