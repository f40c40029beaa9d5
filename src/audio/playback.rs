//! Playback lifecycle: `Idle → Playing → Idle`.
//!
//! The speaker is in the browser.  [`PlaybackController::start`] moves the
//! synthesized buffer in, the front end pulls it once with
//! [`take_stream`](PlaybackController::take_stream), and reports the end of
//! playback through [`finish`](PlaybackController::finish).
//!
//! Only one playback is ever active; refusing a second one is the turn
//! orchestrator's job, so `start` here does not gate.

use super::buffer::AudioBuffer;
use super::ControllerError;

/// Playback sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
}

#[derive(Debug, Default)]
pub struct PlaybackController {
    state: PlaybackState,
    stream: Option<AudioBuffer>,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Begin playing `buffer`.
    pub fn start(&mut self, buffer: AudioBuffer) {
        log::debug!("playback: Idle → Playing ({} bytes, {})", buffer.len(), buffer.encoding());
        self.stream = Some(buffer);
        self.state = PlaybackState::Playing;
    }

    /// Hand the audio to the output device.  Yields the buffer at most once
    /// per playback and only while playing.
    pub fn take_stream(&mut self) -> Option<AudioBuffer> {
        if !self.is_playing() {
            return None;
        }
        self.stream.take()
    }

    /// End-of-playback notification.
    pub fn finish(&mut self) -> Result<(), ControllerError> {
        if !self.is_playing() {
            return Err(ControllerError::NotPlaying);
        }
        self.stream = None;
        self.state = PlaybackState::Idle;
        log::debug!("playback: Playing → Idle");
        Ok(())
    }
}
