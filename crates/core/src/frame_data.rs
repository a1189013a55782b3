//! Frame data snapshot: the per-job materialization of a resolved reel.
//!
//! Written once when a job is created and read many times by the
//! out-of-process renderer, once per frame it captures. The snapshot is
//! self-contained: a reader never needs the original request.

use serde::{Deserialize, Serialize};

use crate::request::RenderRequest;
use crate::resolve::{Frame, ResolvedReel};
use crate::types::JobId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameData {
    pub job_id: JobId,
    pub script_title: String,
    #[serde(flatten)]
    pub reel: ResolvedReel,
    /// Spoken over the logo slide. Empty when there is no outro.
    #[serde(default)]
    pub outro_voiceover: String,
    /// N + 1; the logo slide is the last frame.
    pub frame_count: usize,
}

impl FrameData {
    /// Resolve `request` into the snapshot stored for `job_id`.
    pub fn from_request(job_id: JobId, request: &RenderRequest) -> Self {
        let reel = request.resolve();
        Self {
            job_id,
            script_title: request.script_title.clone(),
            frame_count: reel.frame_count(),
            reel,
            outro_voiceover: request.timeline.outro_voiceover.clone(),
        }
    }

    /// Frame `index` under the shared addressing rule.
    pub fn frame(&self, index: usize) -> Option<Frame<'_>> {
        self.reel.frame(index)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::BrandAssets;
    use crate::timeline::{Slide, Timeline};

    fn request() -> RenderRequest {
        let mut request = RenderRequest::new(
            Timeline::new(vec![
                Slide::new("First"),
                Slide::new("Second").with_color("#ff0000"),
            ])
            .with_outro("Find us online"),
            BrandAssets::named("Acme"),
            "light",
        );
        request.script_title = "Launch".into();
        request
    }

    #[test]
    fn snapshot_counts_logo_frame() {
        let data = FrameData::from_request(JobId::new(), &request());
        assert_eq!(data.frame_count, 3);
        assert_eq!(data.reel.slides.len(), 2);
    }

    #[test]
    fn snapshot_carries_resolved_colors() {
        let data = FrameData::from_request(JobId::new(), &request());
        assert_eq!(data.reel.slides[0].color, "#1a1a2e");
        assert_eq!(data.reel.slides[1].color, "#ff0000");
    }

    #[test]
    fn last_frame_is_logo() {
        let data = FrameData::from_request(JobId::new(), &request());
        assert!(matches!(data.frame(2), Some(Frame::Logo(l)) if l.initials == "AC"));
        assert!(data.frame(3).is_none());
    }

    #[test]
    fn json_is_flat_and_parses_back() {
        let data = FrameData::from_request(JobId::new(), &request());
        let json = data.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["theme"]["id"], "light");
        assert_eq!(value["logo"]["brand_name"], "Acme");
        assert_eq!(value["outro_voiceover"], "Find us online");

        let back: FrameData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }
}
