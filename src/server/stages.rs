//! Stateless stage endpoints.
//!
//! Each route runs exactly one remote stage and touches neither the session
//! state nor the conversation store.  The front end may chain them itself.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    response::Response,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::conversation::ChatMessage;
use crate::pipeline::Stage;

use super::{audio_response, audio_upload, ApiError, ApiState};

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/speech-to-text", post(speech_to_text))
        .route("/api/chat", post(chat))
        .route("/api/text-to-speech", post(text_to_speech))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// Transcribe an uploaded recording: a `file` form part or a raw `audio/*`
/// body.
async fn speech_to_text(
    State(state): State<Arc<ApiState>>,
    request: Request,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    let audio = audio_upload(request).await?;
    if audio.is_empty() {
        return Err(ApiError::BadRequest("No audio uploaded".into()));
    }

    let text = state
        .gateways
        .transcriber
        .transcribe(&audio, &state.settings.language)
        .await
        .map_err(|e| ApiError::stage(Stage::Transcribe, e))?;

    Ok(Json(TranscriptionResponse { text }))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Lecture text; absent or empty selects the generic instruction.
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

async fn chat(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;

    let instruction = state
        .prompt
        .system_instruction(request.context.as_deref().unwrap_or_default());
    let reply = state
        .gateways
        .completer
        .complete(&instruction, &request.messages)
        .await
        .map_err(|e| ApiError::stage(Stage::Complete, e))?;

    Ok(Json(ChatResponse { reply }))
}

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: String,
}

/// Synthesize `text`; the body is the encoded audio.
async fn text_to_speech(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;

    let audio = state
        .gateways
        .synthesizer
        .synthesize(&request.text, &state.settings.voice)
        .await
        .map_err(|e| ApiError::stage(Stage::Synthesize, e))?;

    Ok(audio_response(audio))
}
