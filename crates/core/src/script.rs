//! Script generation seam.
//!
//! The text generator is an external collaborator; only its contract lives
//! here. A response that does not carry exactly the requested number of
//! slides is an upstream failure, never silently truncated or padded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, UpstreamError};
use crate::timeline::{validate_slide_count, Slide, Timeline};

const SERVICE: &str = "script generator";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRequest {
    pub prompt: String,
    #[serde(default, alias = "researchContext")]
    pub research_context: Option<String>,
    #[serde(alias = "slideCount")]
    pub slide_count: usize,
}

impl ScriptRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.prompt.trim().is_empty() {
            return Err(CoreError::Validation("Prompt is required".into()));
        }
        validate_slide_count(self.slide_count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedScript {
    pub title: String,
    pub slides: Vec<String>,
}

impl GeneratedScript {
    /// Check the slide count against `expected` and build a timeline with
    /// default styling.
    pub fn into_timeline(self, expected: usize) -> Result<Timeline, UpstreamError> {
        if self.slides.len() != expected {
            return Err(UpstreamError::InvalidResponse {
                service: SERVICE,
                message: format!(
                    "expected {expected} slides, got {}",
                    self.slides.len()
                ),
            });
        }
        Ok(Timeline::new(self.slides.into_iter().map(Slide::new).collect()))
    }
}

/// Turns a prompt into a titled slide script.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(&self, request: &ScriptRequest) -> Result<GeneratedScript, UpstreamError>;
}

/// Run `generator` and enforce the slide-count contract on its answer.
pub async fn generate_timeline(
    generator: &dyn ScriptGenerator,
    request: &ScriptRequest,
) -> Result<(String, Timeline), UpstreamError> {
    let script = generator.generate(request).await?;
    let title = script.title.clone();
    let timeline = script.into_timeline(request.slide_count)?;
    Ok((title, timeline))
}
