//! Text-to-speech gateway.
//!
//! [`ApiSynthesizer`] posts to `{base_url}/v1/audio/speech` and returns the
//! MP3 body as an [`AudioBuffer`] tagged `audio/mpeg`.

use async_trait::async_trait;
use serde::Serialize;

use crate::audio::{AudioBuffer, SYNTHESIS_ENCODING};
use crate::config::{ApiConfig, TtsConfig};

use super::{authorize, endpoint, ensure_success, http_client, GatewayError};

/// Which voice speaks the reply, and how fast.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceProfile {
    pub voice: String,
    pub speed: f32,
}

impl VoiceProfile {
    pub fn from_config(tts: &TtsConfig) -> Self {
        Self {
            voice: tts.voice.clone(),
            speed: tts.speed,
        }
    }
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self::from_config(&TtsConfig::default())
    }
}

/// Async trait for speech-synthesis backends.
///
/// Returns `Err(InvalidInput)` for empty or whitespace-only `text` without
/// contacting the service.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<AudioBuffer, GatewayError>;
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'static str,
}

/// OpenAI-compatible speech client.
pub struct ApiSynthesizer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl ApiSynthesizer {
    pub fn from_config(api: &ApiConfig, tts: &TtsConfig) -> Self {
        Self {
            client: http_client(api),
            url: endpoint(api, "audio/speech"),
            api_key: api.api_key.clone(),
            model: tts.model.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ApiSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<AudioBuffer, GatewayError> {
        if text.trim().is_empty() {
            return Err(GatewayError::InvalidInput("text is required".into()));
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &voice.voice,
            speed: voice.speed,
            response_format: "mp3",
        };

        log::debug!("tts: synthesizing {} chars with voice {}", text.chars().count(), voice.voice);

        let req = authorize(self.client.post(&self.url), self.api_key.as_deref()).json(&request);
        let response = ensure_success("speech", req.send().await?).await?;
        let audio = response.bytes().await?;

        if audio.is_empty() {
            return Err(GatewayError::Upstream("speech service returned no audio".into()));
        }

        log::info!("tts: received {} bytes", audio.len());
        Ok(AudioBuffer::new(audio.to_vec(), SYNTHESIS_ENCODING))
    }
}
