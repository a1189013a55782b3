//! Speech collaborators: synthesis and playback.
//!
//! Failures here never leave the scheduler; a slide whose narration fails
//! simply holds until its ceiling.

use async_trait::async_trait;
use reelforge_core::error::UpstreamError;
use serde::Serialize;

const SERVICE: &str = "speech synthesis";

/// Synthesized audio for one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechClip {
    pub audio: Vec<u8>,
    pub content_type: String,
}

/// Text-to-speech backend.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<SpeechClip, UpstreamError>;
}

/// Audio output device. Starting playback returns immediately with a
/// handle to the running clip.
pub trait AudioSink: Send + Sync {
    fn start(&self, clip: SpeechClip) -> Result<Box<dyn SpeechPlayback>, UpstreamError>;
}

/// A clip that is currently playing.
///
/// Implementations must stop the audio when dropped, so that replacing a
/// slide's task set silences the previous slide.
#[async_trait]
pub trait SpeechPlayback: Send {
    /// Resolves once the clip has played to its end.
    async fn ended(&mut self);

    fn stop(&mut self);
}

// ---------------------------------------------------------------------------
// HTTP synthesizer
// ---------------------------------------------------------------------------

/// Synthesizer backed by `POST {base}/tts/preview`, which answers with
/// `audio/mpeg` bytes.
pub struct HttpSpeechSynthesizer {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct TtsPreviewBody<'a> {
    text: &'a str,
    voice_id: &'a str,
}

impl HttpSpeechSynthesizer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

fn unreachable(e: reqwest::Error) -> UpstreamError {
    UpstreamError::Unreachable {
        service: SERVICE,
        message: e.to_string(),
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<SpeechClip, UpstreamError> {
        let response = self
            .client
            .post(format!("{}/tts/preview", self.base_url))
            .json(&TtsPreviewBody { text, voice_id })
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(UpstreamError::InvalidResponse {
                service: SERVICE,
                message: format!("status {}: {body}", status.as_u16()),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let audio = response.bytes().await.map_err(unreachable)?.to_vec();
        if audio.is_empty() {
            return Err(UpstreamError::InvalidResponse {
                service: SERVICE,
                message: "empty audio body".into(),
            });
        }

        Ok(SpeechClip {
            audio,
            content_type,
        })
    }
}
