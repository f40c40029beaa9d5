//! Turn orchestrator — drives the capture → STT → chat → TTS → playback loop.
//!
//! [`TurnOrchestrator`] owns the [`SharedState`] and is shared by the HTTP
//! handlers through an `Arc`.  Exactly one turn is in flight at a time; the
//! gate is a check-and-transition under the session mutex, so a second
//! request while busy is refused rather than queued.
//!
//! # Turn flow
//!
//! ```text
//! start_capture()               Idle/Playing ─▶ capture Recording
//! stop_capture(buffer)          capture Recording ─▶ buffer pending
//! run_turn()
//!   └─▶ take buffer ─▶ transcriber.transcribe        [Transcribing]
//!         ├─ empty   ─▶ Idle, nothing recorded         (NoSpeech)
//!         ├─ Err     ─▶ Idle + error                   (Failed)
//!         └─ Ok      ─▶ append user
//!               └─▶ completer.complete               [Completing]
//!                     ├─ Err ─▶ Idle + error, user message kept
//!                     └─ Ok  ─▶ append assistant
//!                           └─▶ synthesizer.synthesize  [Synthesizing]
//!                                 ├─ Err ─▶ Idle + error, both messages kept
//!                                 └─ Ok  ─▶ playback.start  [Playing]
//! playback_ended()              Playing ─▶ Idle
//! ```
//!
//! Suspension points are the three gateway calls; every state transition and
//! store mutation between them happens synchronously, with no lock held
//! across an `.await`.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::audio::{AudioBuffer, ControllerError};
use crate::config::AppConfig;
use crate::conversation::{ChatMessage, ConversationStore, PromptBuilder, Role};
use crate::gateway::{GatewayError, Gateways, VoiceProfile};

use super::state::{lock, SessionSnapshot, SharedState, TurnState};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One remote call within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Transcribe,
    Complete,
    Synthesize,
}

impl Stage {
    /// Prefix of the user-visible message when this stage fails.
    pub fn failure_label(&self) -> &'static str {
        match self {
            Stage::Transcribe => "Failed to transcribe audio",
            Stage::Complete => "Failed to get chat response",
            Stage::Synthesize => "Failed to generate speech",
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Outcome taxonomy for a turn that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// Data handed to a stage failed its precondition.
    #[error("{0}")]
    InvalidInput(String),
    /// A remote service failed or answered with something unusable.
    #[error("{0}")]
    Upstream(String),
    /// Transcription heard nothing.  Not a failure: the turn is dropped
    /// silently.
    #[error("no speech detected")]
    EmptyResult,
}

impl TurnError {
    pub fn kind(&self) -> &'static str {
        match self {
            TurnError::InvalidInput(_) => "invalid_input",
            TurnError::Upstream(_) => "upstream",
            TurnError::EmptyResult => "empty_result",
        }
    }
}

impl From<GatewayError> for TurnError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvalidInput(msg) => TurnError::InvalidInput(msg),
            GatewayError::Upstream(msg) => TurnError::Upstream(msg),
        }
    }
}

/// A capture or turn request refused by the state gate.  Refusals never
/// change state or history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("a turn is already in progress ({})", .0.label())]
    Busy(TurnState),
    #[error("no captured audio to process")]
    NothingCaptured,
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

// ---------------------------------------------------------------------------
// TurnReport
// ---------------------------------------------------------------------------

/// What happened to one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnReport {
    /// Both messages recorded and the reply is playing.
    Completed { transcript: String, reply: String },
    /// Transcription was empty; nothing recorded.
    NoSpeech,
    /// A stage failed.  Texts already recorded before the failure are echoed.
    Failed {
        stage: Stage,
        kind: &'static str,
        error: String,
        transcript: Option<String>,
        reply: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// TurnSettings
// ---------------------------------------------------------------------------

/// Per-turn parameters taken from config.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Language hint for transcription; also selects the prompt templates.
    pub language: String,
    pub voice: VoiceProfile,
    /// Most-recent message count sent to the chat stage (`None` = all).
    pub history_window: Option<usize>,
}

impl TurnSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            language: config.stt.language.clone(),
            voice: VoiceProfile::from_config(&config.tts),
            history_window: config.chat.history_window,
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// TurnOrchestrator
// ---------------------------------------------------------------------------

/// Drives conversation turns for the single session.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use lecture_voice::audio::AudioBuffer;
/// use lecture_voice::config::AppConfig;
/// use lecture_voice::conversation::ConversationStore;
/// use lecture_voice::gateway::Gateways;
/// use lecture_voice::pipeline::{new_shared_state, TurnOrchestrator, TurnSettings};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let store = Arc::new(ConversationStore::new());
/// let orchestrator = TurnOrchestrator::new(
///     new_shared_state(),
///     Arc::clone(&store),
///     Gateways::from_config(&config),
///     TurnSettings::from_config(&config),
/// );
///
/// orchestrator.start_capture().unwrap();
/// orchestrator.stop_capture(AudioBuffer::new(vec![0; 1024], "audio/webm")).unwrap();
/// let report = orchestrator.run_turn().await.unwrap();
/// println!("{report:?}");
/// # }
/// ```
pub struct TurnOrchestrator {
    state: SharedState,
    store: Arc<ConversationStore>,
    gateways: Gateways,
    prompt: PromptBuilder,
    settings: TurnSettings,
}

impl TurnOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `state`    — session state (also read by the HTTP layer).
    /// * `store`    — lecture context and chat history.
    /// * `gateways` — the three remote stages.
    /// * `settings` — language, voice and history window.
    pub fn new(
        state: SharedState,
        store: Arc<ConversationStore>,
        gateways: Gateways,
        settings: TurnSettings,
    ) -> Self {
        Self {
            state,
            store,
            gateways,
            prompt: PromptBuilder::new(&settings.language),
            settings,
        }
    }

    pub fn state(&self) -> TurnState {
        lock(&self.state).turn
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.state).snapshot()
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Capture / playback events
    // -----------------------------------------------------------------------

    /// Begin recording the next utterance.
    ///
    /// Refused while a stage is in flight.  While a reply is playing the
    /// playback is ended first, so the audio device is never capturing and
    /// playing at once.
    pub fn start_capture(&self) -> Result<(), CaptureError> {
        let mut st = lock(&self.state);

        if st.turn.is_busy() {
            log::debug!("pipeline: capture refused, state = {:?}", st.turn);
            return Err(CaptureError::Busy(st.turn));
        }
        if st.capture.is_recording() {
            return Err(ControllerError::AlreadyRecording.into());
        }
        if st.capture.has_pending() {
            return Err(ControllerError::PendingBuffer.into());
        }

        if st.turn == TurnState::Playing {
            log::debug!("pipeline: capture interrupts playback → Idle");
            // Playing implies the controller is playing.
            let _ = st.playback.finish();
            st.turn = TurnState::Idle;
        }

        st.capture.start()?;
        st.error_message = None;
        Ok(())
    }

    /// Finish the recording; `buffer` waits in the pending slot for
    /// [`run_turn`](Self::run_turn).
    pub fn stop_capture(&self, buffer: AudioBuffer) -> Result<(), CaptureError> {
        lock(&self.state).capture.stop(buffer)?;
        Ok(())
    }

    /// Abandon the current recording.
    pub fn cancel_capture(&self) {
        lock(&self.state).capture.cancel();
    }

    /// Move the reply audio out for the output device.
    pub fn take_playback(&self) -> Option<AudioBuffer> {
        lock(&self.state).playback.take_stream()
    }

    /// End-of-playback notification: `Playing → Idle`.
    pub fn playback_ended(&self) -> Result<(), CaptureError> {
        let mut st = lock(&self.state);
        st.playback.finish()?;
        if st.turn == TurnState::Playing {
            st.turn = TurnState::Idle;
        }
        log::debug!("pipeline: playback ended → Idle");
        Ok(())
    }

    /// Empty the chat history.  Refused while a stage is in flight so a turn
    /// never loses one of its two messages.
    pub fn clear_history(&self) -> Result<(), CaptureError> {
        let st = lock(&self.state);
        if st.turn.is_busy() {
            return Err(CaptureError::Busy(st.turn));
        }
        self.store.clear();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // The turn
    // -----------------------------------------------------------------------

    /// Consume the pending capture and run the three stages.
    ///
    /// `Err` means the gate refused the request and nothing changed.  Every
    /// admitted turn yields `Ok(report)` and leaves the state in `Playing`
    /// (success) or `Idle` (anything else).
    pub async fn run_turn(&self) -> Result<TurnReport, CaptureError> {
        // ── 0. Gate + consume buffer ─────────────────────────────────────
        let audio = {
            let mut st = lock(&self.state);
            if st.turn != TurnState::Idle {
                return Err(CaptureError::Busy(st.turn));
            }
            let audio = st.capture.take().ok_or(CaptureError::NothingCaptured)?;
            st.turn = TurnState::Transcribing;
            st.error_message = None;
            audio
        };

        log::debug!("pipeline: Idle → Transcribing ({} bytes)", audio.len());

        // ── 1. Transcribe ────────────────────────────────────────────────
        let transcribed = self
            .gateways
            .transcriber
            .transcribe(&audio, &self.settings.language)
            .await
            .map_err(TurnError::from)
            .and_then(non_empty_transcript);
        drop(audio);

        let transcript = match transcribed {
            Ok(text) => text,
            Err(TurnError::EmptyResult) => {
                log::info!("pipeline: no speech detected, dropping turn");
                self.set_turn(TurnState::Idle);
                return Ok(TurnReport::NoSpeech);
            }
            Err(e) => return Ok(self.fail(Stage::Transcribe, e, None, None)),
        };

        // ── 2. Record user message, build request ────────────────────────
        self.store.append(Role::User, transcript.clone());
        let (instruction, history) = {
            let mut st = lock(&self.state);
            st.last_transcript = Some(transcript.clone());
            st.last_reply = None;
            st.turn = TurnState::Completing;
            (
                self.prompt.system_instruction(&self.store.get_context()),
                self.history_for_request(),
            )
        };

        log::debug!("pipeline: Transcribing → Completing ({} messages)", history.len());

        // ── 3. Complete ──────────────────────────────────────────────────
        let reply = match self.gateways.completer.complete(&instruction, &history).await {
            Ok(reply) => reply,
            Err(e) => return Ok(self.fail(Stage::Complete, e.into(), Some(transcript), None)),
        };

        // ── 4. Record assistant message ──────────────────────────────────
        self.store.append(Role::Assistant, reply.clone());
        {
            let mut st = lock(&self.state);
            st.last_reply = Some(reply.clone());
            st.turn = TurnState::Synthesizing;
        }

        log::debug!("pipeline: Completing → Synthesizing");

        // ── 5. Synthesize ────────────────────────────────────────────────
        let speech = match self
            .gateways
            .synthesizer
            .synthesize(&reply, &self.settings.voice)
            .await
        {
            Ok(speech) => speech,
            Err(e) => {
                return Ok(self.fail(Stage::Synthesize, e.into(), Some(transcript), Some(reply)))
            }
        };

        // ── 6. Hand over to playback ─────────────────────────────────────
        {
            let mut st = lock(&self.state);
            st.playback.start(speech);
            st.turn = TurnState::Playing;
        }

        log::debug!("pipeline: Synthesizing → Playing");
        Ok(TurnReport::Completed { transcript, reply })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// History as sent to the chat stage, windowed when configured.  The
    /// window never drops the newest (user) message.
    fn history_for_request(&self) -> Vec<ChatMessage> {
        match self.settings.history_window {
            Some(n) => self.store.recent_history(n.max(1)),
            None => self.store.get_history(),
        }
    }

    fn set_turn(&self, turn: TurnState) {
        lock(&self.state).turn = turn;
    }

    fn fail(
        &self,
        stage: Stage,
        error: TurnError,
        transcript: Option<String>,
        reply: Option<String>,
    ) -> TurnReport {
        let message = format!("{}: {error}", stage.failure_label());
        log::error!("pipeline error: {message}");

        let mut st = lock(&self.state);
        st.turn = TurnState::Idle;
        st.error_message = Some(message.clone());

        TurnReport::Failed {
            stage,
            kind: error.kind(),
            error: message,
            transcript,
            reply,
        }
    }
}

/// Whitespace-only transcripts count as silence.
fn non_empty_transcript(text: String) -> Result<String, TurnError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TurnError::EmptyResult);
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
