//! Speech-to-text gateway.
//!
//! [`ApiTranscriber`] posts the captured buffer as multipart form data to
//! `{base_url}/v1/audio/transcriptions`.  An empty or absent transcript is a
//! valid answer meaning "no speech detected", not an error.

use async_trait::async_trait;
use serde::Deserialize;

use crate::audio::AudioBuffer;
use crate::config::{ApiConfig, SttConfig};

use super::{authorize, endpoint, ensure_success, http_client, GatewayError};

/// Object-safe, thread-safe interface for transcription backends.
///
/// # Contract
///
/// - `Err(InvalidInput)` when `audio` is empty; nothing is sent.
/// - `Ok("")` when the service heard no speech.
/// - `Err(Upstream)` on transport failure, non-2xx status or an
///   undecodable body.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &AudioBuffer, language: &str) -> Result<String, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: Option<String>,
}

/// OpenAI-compatible transcription client.
pub struct ApiTranscriber {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl ApiTranscriber {
    pub fn from_config(api: &ApiConfig, stt: &SttConfig) -> Self {
        Self {
            client: http_client(api),
            url: endpoint(api, "audio/transcriptions"),
            api_key: api.api_key.clone(),
            model: stt.model.clone(),
        }
    }
}

#[async_trait]
impl Transcriber for ApiTranscriber {
    async fn transcribe(&self, audio: &AudioBuffer, language: &str) -> Result<String, GatewayError> {
        if audio.is_empty() {
            return Err(GatewayError::InvalidInput("audio buffer is empty".into()));
        }

        log::debug!(
            "stt: sending {} bytes ({}) to {}",
            audio.len(),
            audio.encoding(),
            self.url
        );

        let part = reqwest::multipart::Part::bytes(audio.bytes().to_vec())
            .file_name(audio.file_name())
            .mime_str(&audio.mime_essence())
            .map_err(|e| GatewayError::InvalidInput(format!("bad audio encoding: {e}")))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());
        if !language.is_empty() {
            form = form.text("language", language.to_string());
        }

        let req = authorize(self.client.post(&self.url), self.api_key.as_deref()).multipart(form);
        let response = ensure_success("transcription", req.send().await?).await?;

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Upstream(format!("failed to parse transcription: {e}")))?;

        let text = parsed.text.unwrap_or_default();
        log::info!("stt: transcript = {text:?}");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcriber() -> ApiTranscriber {
        // Port 9 (discard) on localhost: never contacted by these tests.
        let api = ApiConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..ApiConfig::default()
        };
        ApiTranscriber::from_config(&api, &SttConfig::default())
    }

    #[test]
    fn from_config_resolves_endpoint() {
        let t = transcriber();
        assert_eq!(t.url, "http://127.0.0.1:9/v1/audio/transcriptions");
        assert_eq!(t.model, "whisper-1");
    }

    #[tokio::test]
    async fn empty_audio_is_invalid_input() {
        let err = transcriber()
            .transcribe(&AudioBuffer::new(Vec::new(), "audio/webm"), "ja")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }

    #[test]
    fn absent_text_field_parses_as_none() {
        let parsed: TranscriptionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.text.is_none());
        let parsed: TranscriptionResponse = serde_json::from_str(r#"{"text":"こんにちは"}"#).unwrap();
        assert_eq!(parsed.text.as_deref(), Some("こんにちは"));
    }

    #[test]
    fn transcriber_is_object_safe() {
        let _: Box<dyn Transcriber> = Box::new(transcriber());
    }

    // ---- over HTTP ---

    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::{
        body::Bytes,
        http::{header, HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };

    use crate::gateway::stub;

    const PATH: &str = "/v1/audio/transcriptions";

    fn clip() -> AudioBuffer {
        AudioBuffer::new(vec![0x1A, 0x45, 0xDF, 0xA3, 1, 2, 3, 4], "audio/webm;codecs=opus")
    }

    async fn against(router: Router) -> ApiTranscriber {
        ApiTranscriber::from_config(&stub::serve(router).await, &SttConfig::default())
    }

    #[tokio::test]
    async fn sends_form_with_bearer_and_returns_text() {
        let seen: Arc<Mutex<Option<(String, Vec<u8>)>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let router = Router::new().route(
            PATH,
            post(move |headers: HeaderMap, body: Bytes| {
                let sink = Arc::clone(&sink);
                async move {
                    let auth = headers
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    *sink.lock().unwrap() = Some((auth, body.to_vec()));
                    Json(serde_json::json!({ "text": "こんにちは" }))
                }
            }),
        );

        let text = against(router).await.transcribe(&clip(), "ja").await.unwrap();
        assert_eq!(text, "こんにちは");

        let (auth, body) = seen.lock().unwrap().take().expect("request reached stub");
        assert_eq!(auth, format!("Bearer {}", stub::TEST_KEY));
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("name=\"file\"; filename=\"audio.webm\""), "{body}");
        assert!(body.contains("Content-Type: audio/webm"), "{body}");
        assert!(body.contains("whisper-1"));
        assert!(body.contains("name=\"language\""));
    }

    #[tokio::test]
    async fn empty_response_object_means_no_speech() {
        let router = Router::new().route(PATH, post(|| async { Json(serde_json::json!({})) }));
        let text = against(router).await.transcribe(&clip(), "ja").await.unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn error_status_is_upstream_with_body() {
        let router = Router::new().route(
            PATH,
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );
        let err = against(router).await.transcribe(&clip(), "ja").await.unwrap_err();
        match err {
            GatewayError::Upstream(msg) => {
                assert!(msg.contains("503"), "{msg}");
                assert!(msg.contains("overloaded"), "{msg}");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_upstream() {
        let router = Router::new().route(PATH, post(|| async { "not json" }));
        let err = against(router).await.transcribe(&clip(), "ja").await.unwrap_err();
        assert!(matches!(err, GatewayError::Upstream(ref m) if m.contains("parse")), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_service_is_upstream() {
        let t = ApiTranscriber::from_config(&stub::unreachable().await, &SttConfig::default());
        let err = t.transcribe(&clip(), "ja").await.unwrap_err();
        assert!(matches!(err, GatewayError::Upstream(_)), "{err:?}");
    }

    #[tokio::test]
    async fn slow_service_times_out_as_upstream() {
        let router = Router::new().route(
            PATH,
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(serde_json::json!({ "text": "late" }))
            }),
        );
        let api = ApiConfig {
            timeout_secs: 1,
            ..stub::serve(router).await
        };
        let t = ApiTranscriber::from_config(&api, &SttConfig::default());

        let err = t.transcribe(&clip(), "ja").await.unwrap_err();
        assert_eq!(err, GatewayError::Upstream("request timed out".into()));
    }
}
