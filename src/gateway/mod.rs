//! Remote stage gateways — one adapter per pipeline stage.
//!
//! * [`Transcriber`] / [`ApiTranscriber`] — speech-to-text.
//! * [`ChatCompleter`] / [`ApiCompleter`] — contextual chat completion.
//! * [`SpeechSynthesizer`] / [`ApiSynthesizer`] — text-to-speech.
//! * [`GatewayError`] — the two failure kinds every gateway reports.
//!
//! Each trait is object-safe and `Send + Sync` so the orchestrator and the
//! HTTP layer share one instance through `Arc<dyn …>`.  The `Api*`
//! implementations speak the OpenAI REST wire format; all connection details
//! come from [`ApiConfig`].  No gateway retries: the caller decides.

pub mod complete;
pub mod synthesize;
pub mod transcribe;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub(crate) mod stub;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{ApiConfig, AppConfig};

pub use complete::{ApiCompleter, ChatCompleter};
pub use synthesize::{ApiSynthesizer, SpeechSynthesizer, VoiceProfile};
pub use transcribe::{ApiTranscriber, Transcriber};

// ---------------------------------------------------------------------------
// GatewayError
// ---------------------------------------------------------------------------

/// Failure of a single remote stage call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Caller-supplied data failed a precondition (empty audio, empty text,
    /// malformed history).  Nothing was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The remote service was unreachable, rejected the request, timed out
    /// or answered with something unusable.
    #[error("upstream service error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Upstream("request timed out".into())
        } else {
            GatewayError::Upstream(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Gateways bundle
// ---------------------------------------------------------------------------

/// The three stage gateways, shared by the orchestrator and the stateless
/// stage endpoints.
#[derive(Clone)]
pub struct Gateways {
    pub transcriber: Arc<dyn Transcriber>,
    pub completer: Arc<dyn ChatCompleter>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Gateways {
    /// Build the HTTP-backed gateways described by `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            transcriber: Arc::new(ApiTranscriber::from_config(&config.api, &config.stt)),
            completer: Arc::new(ApiCompleter::from_config(&config.api, &config.chat)),
            synthesizer: Arc::new(ApiSynthesizer::from_config(&config.api, &config.tts)),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared HTTP plumbing
// ---------------------------------------------------------------------------

/// Client with the per-request timeout from `api.timeout_secs`.
///
/// Falls back to a default client if the builder fails.
pub(crate) fn http_client(api: &ApiConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(api.timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// `{base_url}/v1/{path}` with any trailing slash on `base_url` removed.
pub(crate) fn endpoint(api: &ApiConfig, path: &str) -> String {
    format!("{}/v1/{}", api.base_url.trim_end_matches('/'), path)
}

/// Attach `Authorization: Bearer …` only when a non-empty key is configured.
pub(crate) fn authorize(req: reqwest::RequestBuilder, api_key: Option<&str>) -> reqwest::RequestBuilder {
    match api_key {
        Some(key) if !key.is_empty() => req.bearer_auth(key),
        _ => req,
    }
}

/// Turn a non-2xx response into [`GatewayError::Upstream`] carrying the body.
pub(crate) async fn ensure_success(
    stage: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::warn!("{stage}: remote returned {status}: {body}");
    Err(GatewayError::Upstream(format!("{stage} API error {status}: {body}")))
}
