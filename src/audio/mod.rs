//! Capture / playback controllers and the encoded audio they exchange.
//!
//! # Lifecycle
//!
//! ```text
//! browser mic ──stop──▶ CaptureController ──take()──▶ TurnOrchestrator
//!                                                         │ synthesize
//!                                                         ▼
//! browser speaker ◀──take_stream()── PlaybackController ◀─start(buffer)
//!        │
//!        └──ended──▶ PlaybackController::finish()
//! ```
//!
//! Buffers are moved at every hop, never shared.

pub mod buffer;
pub mod capture;
pub mod playback;

use thiserror::Error;

pub use buffer::{AudioBuffer, PendingSlot, DEFAULT_CAPTURE_ENCODING, SYNTHESIS_ENCODING};
pub use capture::{CaptureController, CaptureState};
pub use playback::{PlaybackController, PlaybackState};

/// Lifecycle violations reported by the controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("the previous recording has not been processed yet")]
    PendingBuffer,
    #[error("no recording in progress")]
    NotRecording,
    #[error("nothing is playing")]
    NotPlaying,
}
