//! Session endpoints for the single conversation.
//!
//! ```text
//! POST /api/session/capture/start   mic opened            (409 while busy)
//! POST /api/session/capture/stop    audio body → run turn → TurnReport
//! GET  /api/session/playback        reply audio, once     (404 otherwise)
//! POST /api/session/playback/ended  Playing → Idle
//! ```

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::conversation::ChatMessage;
use crate::pipeline::{SessionSnapshot, TurnReport};

use super::{audio_response, audio_upload, ApiError, ApiState};

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/context", get(get_context).put(put_context))
        .route("/api/history", get(get_history).delete(clear_history))
        .route("/api/session", get(get_session))
        .route("/api/session/capture/start", post(capture_start))
        .route("/api/session/capture/stop", post(capture_stop))
        .route("/api/session/capture/cancel", post(capture_cancel))
        .route("/api/session/playback", get(playback))
        .route("/api/session/playback/ended", post(playback_ended))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Context / history
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ContextBody {
    #[serde(default)]
    pub context: String,
}

async fn get_context(State(state): State<Arc<ApiState>>) -> Json<ContextBody> {
    Json(ContextBody {
        context: state.store.get_context(),
    })
}

async fn put_context(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<ContextBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = payload?;
    state.store.set_context(body.context);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct HistoryBody {
    pub messages: Vec<ChatMessage>,
}

async fn get_history(State(state): State<Arc<ApiState>>) -> Json<HistoryBody> {
    Json(HistoryBody {
        messages: state.store.get_history(),
    })
}

async fn clear_history(State(state): State<Arc<ApiState>>) -> Result<StatusCode, ApiError> {
    state.orchestrator.clear_history()?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Turn lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
    pub messages: Vec<ChatMessage>,
}

async fn get_session(State(state): State<Arc<ApiState>>) -> Json<SessionView> {
    Json(SessionView {
        snapshot: state.orchestrator.snapshot(),
        messages: state.store.get_history(),
    })
}

async fn capture_start(State(state): State<Arc<ApiState>>) -> Result<StatusCode, ApiError> {
    state.orchestrator.start_capture()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn capture_cancel(State(state): State<Arc<ApiState>>) -> StatusCode {
    state.orchestrator.cancel_capture();
    StatusCode::NO_CONTENT
}

/// Hand the recording to the orchestrator and run its turn.
async fn capture_stop(
    State(state): State<Arc<ApiState>>,
    request: Request,
) -> Result<Json<TurnReport>, ApiError> {
    let audio = audio_upload(request).await?;
    state.orchestrator.stop_capture(audio)?;

    // Detached so a dropped connection cannot leave the turn half-run.
    let orchestrator = Arc::clone(&state.orchestrator);
    let report = tokio::spawn(async move { orchestrator.run_turn().await })
        .await
        .map_err(|e| ApiError::Internal(format!("turn task failed: {e}")))??;

    Ok(Json(report))
}

async fn playback(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    state
        .orchestrator
        .take_playback()
        .map(audio_response)
        .ok_or_else(|| ApiError::NotFound("nothing is playing".into()))
}

async fn playback_ended(State(state): State<Arc<ApiState>>) -> Result<StatusCode, ApiError> {
    state.orchestrator.playback_ended()?;
    Ok(StatusCode::NO_CONTENT)
}
