//! Turn pipeline for the lecture voice assistant.
//!
//! This module wires the capture → STT → chat → TTS → playback loop and
//! exposes the shared session state that the HTTP layer reports.
//!
//! # Architecture
//!
//! ```text
//! POST /api/session/capture/start ─▶ TurnOrchestrator::start_capture
//! POST /api/session/capture/stop  ─▶ TurnOrchestrator::stop_capture
//!                                        └─▶ run_turn()
//!                                              ├─ Transcriber::transcribe     → Transcribing
//!                                              ├─ ChatCompleter::complete     → Completing
//!                                              ├─ SpeechSynthesizer::synthesize → Synthesizing
//!                                              └─ PlaybackController::start   → Playing
//! POST /api/session/playback/ended ─▶ TurnOrchestrator::playback_ended → Idle
//!
//! SharedState (Arc<Mutex<SessionState>>) ←─── read by GET /api/session
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{CaptureError, Stage, TurnError, TurnOrchestrator, TurnReport, TurnSettings};
pub use state::{new_shared_state, SessionSnapshot, SessionState, SharedState, TurnState};
