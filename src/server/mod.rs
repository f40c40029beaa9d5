//! HTTP API for the browser front end.
//!
//! Two groups of routes share one [`ApiState`]:
//!
//! * [`stages`] — stateless speech-to-text, chat and text-to-speech calls.
//! * [`session`] — the single conversation: lecture context, history and the
//!   capture → turn → playback lifecycle driven by [`TurnOrchestrator`].
//!
//! Errors always leave as `{"error": "<message>"}` (see [`ApiError`]).

pub mod error;
pub mod session;
pub mod stages;

use std::sync::Arc;

use anyhow::Context as _;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::audio::{AudioBuffer, DEFAULT_CAPTURE_ENCODING};
use crate::config::ServerConfig;
use crate::conversation::{ConversationStore, PromptBuilder};
use crate::gateway::Gateways;
use crate::pipeline::{TurnOrchestrator, TurnSettings};

pub use error::ApiError;

/// Shared handles for every route.
pub struct ApiState {
    pub orchestrator: Arc<TurnOrchestrator>,
    pub store: Arc<ConversationStore>,
    pub gateways: Gateways,
    pub settings: TurnSettings,
    pub prompt: PromptBuilder,
}

impl ApiState {
    /// Stage endpoints reuse the orchestrator's language and voice.
    pub fn new(
        orchestrator: Arc<TurnOrchestrator>,
        store: Arc<ConversationStore>,
        gateways: Gateways,
    ) -> Self {
        let settings = orchestrator.settings().clone();
        Self {
            prompt: PromptBuilder::new(&settings.language),
            orchestrator,
            store,
            gateways,
            settings,
        }
    }
}

/// Build the full router.
pub fn router(state: Arc<ApiState>, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(stages::router(state.clone()))
        .merge(session::router(state))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
}

/// Bind `config.bind` and serve until the process ends.
///
/// # Errors
///
/// Returns error if the listener cannot bind or the server fails.
pub async fn serve(config: &ServerConfig, state: Arc<ApiState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind API server on {}", config.bind))?;

    log::info!("server: listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state, config.max_body_bytes))
        .await
        .context("API server error")?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// Audio helpers shared by both route groups
// ---------------------------------------------------------------------------

/// Read an uploaded recording.
///
/// Accepts either a `multipart/form-data` form whose `file` part carries the
/// audio (the browser's `FormData` upload) or a raw `audio/*` body.  A raw
/// body without `Content-Type` is taken as `audio/webm`.
pub(crate) async fn audio_upload(request: Request) -> Result<AudioBuffer, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim()
        .to_string();
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "multipart/form-data" {
        let mut form = Multipart::from_request(request, &()).await?;
        while let Some(field) = form.next_field().await? {
            if field.name() != Some("file") {
                continue;
            }
            let encoding = field
                .content_type()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(DEFAULT_CAPTURE_ENCODING)
                .to_string();
            let data = field.bytes().await?;
            log::debug!("api: multipart file part, {} bytes ({encoding})", data.len());
            return Ok(AudioBuffer::new(data.to_vec(), encoding));
        }
        return Err(ApiError::BadRequest("No file uploaded".into()));
    }

    let encoding = match essence.as_str() {
        "" => DEFAULT_CAPTURE_ENCODING.to_string(),
        e if e.starts_with("audio/") => content_type,
        _ => {
            return Err(ApiError::UnsupportedMediaType(format!(
                "expected audio/* or multipart/form-data, got {content_type}"
            )))
        }
    };
    let data = Bytes::from_request(request, &()).await?;
    Ok(AudioBuffer::new(data.to_vec(), encoding))
}

/// Raw audio response with `Content-Type` and `Content-Length`.
pub(crate) fn audio_response(audio: AudioBuffer) -> Response {
    let content_type = audio.encoding().to_string();
    let length = audio.len().to_string();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, length),
        ],
        audio.into_bytes(),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::gateway::mock::{MockCompleter, MockSynthesizer, MockTranscriber};

    fn gateways() -> Gateways {
        Gateways {
            transcriber: Arc::new(MockTranscriber::ok("q")),
            completer: Arc::new(MockCompleter::ok("a")),
            synthesizer: Arc::new(MockSynthesizer::ok(&[1])),
        }
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = app(gateways());
        let (status, _, body) = send(&app, request("GET", "/health")).await;

        assert_eq!(status, StatusCode::OK);
        let json = json(&body);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let (app, _) = app(gateways());
        let big = vec![0u8; 2 * 1024 * 1024];
        let (status, _, body) = send(&app, post_audio("/api/speech-to-text", &big, "audio/webm")).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(json(&body)["error"].is_string());
    }

    #[tokio::test]
    async fn raw_upload_takes_encoding_from_content_type() {
        let audio = audio_upload(post_audio("/", &[1, 2, 3], "audio/wav")).await.unwrap();
        assert_eq!(audio.encoding(), "audio/wav");
        assert_eq!(audio.bytes(), &[1, 2, 3]);

        let untyped = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .body(axum::body::Body::from(vec![4u8]))
            .unwrap();
        assert_eq!(audio_upload(untyped).await.unwrap().encoding(), "audio/webm");
    }

    #[tokio::test]
    async fn multipart_upload_yields_only_the_file_part() {
        let audio = audio_upload(post_multipart("/", "file", &[7; 10], "audio/ogg"))
            .await
            .unwrap();
        assert_eq!(audio.len(), 10);
        assert_eq!(audio.encoding(), "audio/ogg");
    }

    #[tokio::test]
    async fn multipart_without_file_part_is_bad_request() {
        let err = audio_upload(post_multipart("/", "recording", &[7; 10], "audio/webm"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No file uploaded");
    }

    #[tokio::test]
    async fn non_audio_upload_is_unsupported() {
        let err = audio_upload(post_audio("/", b"hello", "text/plain")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
