//! Turn state machine and shared session state.
//!
//! [`TurnState`] drives the orchestrator's state machine.  The HTTP layer
//! reads it via [`SharedState`] to tell the front end which controls to
//! enable.
//!
//! [`SessionState`] is the single source of truth for everything a turn
//! touches besides the conversation store: current stage, both audio
//! controllers, and the last user-visible error.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<SessionState>>`.  Lock it
//! for short critical sections only; never hold the guard across `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::audio::{CaptureController, PlaybackController};

// ---------------------------------------------------------------------------
// TurnState
// ---------------------------------------------------------------------------

/// Stage of the current conversation turn.
///
/// ```text
/// Idle ──capture──▶ Transcribing ──text──▶ Completing ──reply──▶ Synthesizing
///   ▲                    │ empty / error        │ error              │ error
///   │◀───────────────────┴──────────────────────┴────────────────────┘
///   │                                                                │ audio
///   └─────────────── playback ended ◀── Playing ◀────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Ready for the next capture.
    #[default]
    Idle,
    /// Waiting on the speech-to-text stage.
    Transcribing,
    /// Waiting on the chat-completion stage.
    Completing,
    /// Waiting on the speech-synthesis stage.
    Synthesizing,
    /// The reply is being played back.
    Playing,
}

impl TurnState {
    /// Returns `true` while a remote stage is in flight.
    ///
    /// The front end disables the microphone control while busy.
    ///
    /// ```
    /// use lecture_voice::pipeline::TurnState;
    ///
    /// assert!(!TurnState::Idle.is_busy());
    /// assert!(TurnState::Transcribing.is_busy());
    /// assert!(TurnState::Completing.is_busy());
    /// assert!(TurnState::Synthesizing.is_busy());
    /// assert!(!TurnState::Playing.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            TurnState::Transcribing | TurnState::Completing | TurnState::Synthesizing
        )
    }

    /// A short human-readable label for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            TurnState::Idle => "Idle",
            TurnState::Transcribing => "Transcribing",
            TurnState::Completing => "Thinking",
            TurnState::Synthesizing => "Generating speech",
            TurnState::Playing => "Speaking",
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Mutable session state owned by the orchestrator.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Current stage of the turn state machine.
    pub turn: TurnState,
    /// Microphone lifecycle and pending capture slot.
    pub capture: CaptureController,
    /// Speaker lifecycle and the buffer being played.
    pub playback: PlaybackController,
    /// Message for the most recent failed turn.  Cleared when a new capture
    /// starts.
    pub error_message: Option<String>,
    /// Transcript of the most recent turn that produced one.
    pub last_transcript: Option<String>,
    /// Reply of the most recent turn that produced one.
    pub last_reply: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view for status reporting.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.turn,
            label: self.turn.label(),
            recording: self.capture.is_recording(),
            error: self.error_message.clone(),
            transcript: self.last_transcript.clone(),
            reply: self.last_reply.clone(),
        }
    }
}

/// Serializable copy of the parts of [`SessionState`] the front end shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: TurnState,
    pub label: &'static str,
    pub recording: bool,
    pub error: Option<String>,
    pub transcript: Option<String>,
    pub reply: Option<String>,
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SessionState`].
pub type SharedState = Arc<Mutex<SessionState>>;

/// Construct a new [`SharedState`] in `Idle`.
pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(SessionState::new()))
}

/// Lock `state`, recovering the guard if a previous holder panicked.
pub(crate) fn lock(state: &SharedState) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
