//! Golden cases for the resolver. The preview and the frame-data snapshot
//! must agree on every one of them.

use reelforge_core::brand::BrandAssets;
use reelforge_core::frame_data::FrameData;
use reelforge_core::request::RenderRequest;
use reelforge_core::resolve::{resolve_slide, Frame};
use reelforge_core::theme::{theme_or_default, THEMES};
use reelforge_core::timeline::{Slide, Timeline};
use reelforge_core::types::JobId;

/// (slide color, theme id, expected color)
const COLOR_CASES: &[(&str, &str, &str)] = &[
    ("", "dark", "#ffffff"),
    ("", "light", "#1a1a2e"),
    ("", "warm-gold", "#1c1917"),
    ("#fff", "dark", "#fff"),
    ("#fff", "light", "#fff"),
    ("#00ff00", "monochrome", "#00ff00"),
    ("", "unknown-theme", "#ffffff"),
];

#[test]
fn color_fallback_golden_cases() {
    for (slide_color, theme_id, expected) in COLOR_CASES {
        let spec = resolve_slide(
            &Slide::new("text").with_color(*slide_color),
            theme_or_default(theme_id),
        );
        assert_eq!(
            spec.color, *expected,
            "slide color {slide_color:?} on theme {theme_id}"
        );
    }
}

#[test]
fn preview_and_snapshot_resolve_identically() {
    for theme in &THEMES {
        let timeline = Timeline::new(vec![
            Slide::new("plain"),
            Slide::new("colored").with_color("#123456"),
            Slide::new("font").with_font("Cinzel-Bold.ttf").with_font_size(64),
        ]);
        let request = RenderRequest::new(timeline.clone(), BrandAssets::named("Acme"), &*theme.id);
        let snapshot = FrameData::from_request(JobId::new(), &request);
        let preview = request.resolve();

        for index in 0..snapshot.frame_count {
            assert_eq!(snapshot.frame(index), preview.frame(index));
        }
        for (slide, resolved) in timeline.slides.iter().zip(&snapshot.reel.slides) {
            assert_eq!(&resolve_slide(slide, theme), resolved);
        }
    }
}

#[test]
fn logo_slide_is_always_last() {
    let request = RenderRequest::new(
        Timeline::new(vec![Slide::new("a")]),
        BrandAssets::named("Acme"),
        "dark",
    );
    let snapshot = FrameData::from_request(JobId::new(), &request);
    assert!(matches!(snapshot.frame(0), Some(Frame::Text(_))));
    assert!(matches!(snapshot.frame(1), Some(Frame::Logo(_))));
}
