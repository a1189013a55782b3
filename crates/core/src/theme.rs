//! Fixed theme catalog.
//!
//! Themes are immutable and looked up by id. An unknown id resolves to
//! the first catalog entry so a stale id never blocks rendering.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Color theme applied to every frame of a reel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: Cow<'static, str>,
    pub bg_gradient: Cow<'static, str>,
    pub overlay_color: Cow<'static, str>,
    pub text_color: Cow<'static, str>,
    pub accent_color: Cow<'static, str>,
}

/// Id of the theme used when none (or an unknown one) is chosen.
pub const DEFAULT_THEME_ID: &str = "dark";

const fn theme(
    id: &'static str,
    bg_gradient: &'static str,
    overlay_color: &'static str,
    text_color: &'static str,
    accent_color: &'static str,
) -> Theme {
    Theme {
        id: Cow::Borrowed(id),
        bg_gradient: Cow::Borrowed(bg_gradient),
        overlay_color: Cow::Borrowed(overlay_color),
        text_color: Cow::Borrowed(text_color),
        accent_color: Cow::Borrowed(accent_color),
    }
}

/// All themes, in display order. The first entry is the fallback.
pub static THEMES: [Theme; 8] = [
    theme(
        "dark",
        "linear-gradient(135deg, #1a1a2e 0%, #0f0f1a 100%)",
        "#1a1a2e",
        "#ffffff",
        "#a78bfa",
    ),
    theme(
        "light",
        "linear-gradient(135deg, #f8f8f8 0%, #e2e8f0 100%)",
        "#f8f8f8",
        "#1a1a2e",
        "#7c3aed",
    ),
    theme(
        "sky-blue",
        "linear-gradient(135deg, #0ea5e9 0%, #0284c7 100%)",
        "#0ea5e9",
        "#ffffff",
        "#7dd3fc",
    ),
    theme(
        "warm-gold",
        "linear-gradient(135deg, #d97706 0%, #b45309 100%)",
        "#d97706",
        "#1c1917",
        "#fcd34d",
    ),
    theme(
        "crimson-red",
        "linear-gradient(135deg, #9f1239 0%, #4c0519 100%)",
        "#9f1239",
        "#ffffff",
        "#f43f5e",
    ),
    theme(
        "forest-green",
        "linear-gradient(135deg, #166534 0%, #14532d 100%)",
        "#166534",
        "#ffffff",
        "#34d399",
    ),
    theme(
        "amethyst",
        "linear-gradient(135deg, #4c1d95 0%, #2e1065 100%)",
        "#4c1d95",
        "#ffffff",
        "#c084fc",
    ),
    theme(
        "monochrome",
        "linear-gradient(135deg, #171717 0%, #000000 100%)",
        "#000000",
        "#ffffff",
        "#a3a3a3",
    ),
];

/// Exact lookup; `None` for ids outside the catalog.
pub fn find_theme(id: &str) -> Option<&'static Theme> {
    THEMES.iter().find(|t| t.id == id)
}

/// Lookup with fallback to the first catalog entry.
pub fn theme_or_default(id: &str) -> &'static Theme {
    find_theme(id).unwrap_or(&THEMES[0])
}
