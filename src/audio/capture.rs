//! Capture lifecycle: `Idle → Recording → Idle`.
//!
//! The microphone itself lives in the browser.  The controller tracks whether
//! a recording is in progress and receives the encoded buffer when it stops,
//! parking it in a single [`PendingSlot`] until the orchestrator consumes it.
//!
//! ```text
//! start()        Idle ──▶ Recording      (refused while a buffer is pending)
//! stop(buffer)   Recording ──▶ Idle      (buffer parked in the slot)
//! take()         slot ──▶ orchestrator   (slot empty again)
//! ```

use super::buffer::{AudioBuffer, PendingSlot};
use super::ControllerError;

/// Capture sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Recording,
}

/// Owns the capture sub-state and the pending-buffer slot.
#[derive(Debug, Default)]
pub struct CaptureController {
    state: CaptureState,
    pending: PendingSlot<AudioBuffer>,
}

impl CaptureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    /// Whether a captured buffer is waiting to be consumed.
    pub fn has_pending(&self) -> bool {
        self.pending.is_occupied()
    }

    /// Begin a recording.
    pub fn start(&mut self) -> Result<(), ControllerError> {
        if self.is_recording() {
            return Err(ControllerError::AlreadyRecording);
        }
        if self.pending.is_occupied() {
            return Err(ControllerError::PendingBuffer);
        }
        self.state = CaptureState::Recording;
        log::debug!("capture: Idle → Recording");
        Ok(())
    }

    /// End the recording and park its buffer.
    ///
    /// An empty buffer is still parked; turning it into an error is the
    /// transcription stage's job.
    pub fn stop(&mut self, buffer: AudioBuffer) -> Result<(), ControllerError> {
        if !self.is_recording() {
            return Err(ControllerError::NotRecording);
        }
        // `start` refuses while occupied, so the slot is empty here.
        self.pending
            .put(buffer)
            .map_err(|_| ControllerError::PendingBuffer)?;
        self.state = CaptureState::Idle;
        log::debug!("capture: Recording → Idle (buffer pending)");
        Ok(())
    }

    /// Abandon a recording without producing a buffer.
    pub fn cancel(&mut self) {
        if self.is_recording() {
            log::debug!("capture: recording cancelled");
        }
        self.state = CaptureState::Idle;
    }

    /// Move the pending buffer out.
    pub fn take(&mut self) -> Option<AudioBuffer> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> AudioBuffer {
        AudioBuffer::new(vec![7; 32], "audio/webm")
    }

    #[test]
    fn start_stop_take_cycle() {
        let mut cap = CaptureController::new();
        assert_eq!(cap.state(), CaptureState::Idle);

        cap.start().unwrap();
        assert!(cap.is_recording());

        cap.stop(clip()).unwrap();
        assert_eq!(cap.state(), CaptureState::Idle);
        assert!(cap.has_pending());

        let buf = cap.take().expect("pending buffer");
        assert_eq!(buf.len(), 32);
        assert!(!cap.has_pending());
        assert!(cap.take().is_none());
    }

    #[test]
    fn start_while_recording_is_refused() {
        let mut cap = CaptureController::new();
        cap.start().unwrap();
        assert_eq!(cap.start(), Err(ControllerError::AlreadyRecording));
        assert!(cap.is_recording());
    }

    #[test]
    fn start_with_unconsumed_buffer_is_refused() {
        let mut cap = CaptureController::new();
        cap.start().unwrap();
        cap.stop(clip()).unwrap();

        assert_eq!(cap.start(), Err(ControllerError::PendingBuffer));
        // The pending buffer survives the refused start.
        assert!(cap.take().is_some());
        assert!(cap.start().is_ok());
    }

    #[test]
    fn stop_while_idle_is_refused() {
        let mut cap = CaptureController::new();
        assert_eq!(cap.stop(clip()), Err(ControllerError::NotRecording));
        assert!(!cap.has_pending());
    }

    #[test]
    fn cancel_discards_recording() {
        let mut cap = CaptureController::new();
        cap.start().unwrap();
        cap.cancel();
        assert_eq!(cap.state(), CaptureState::Idle);
        assert!(!cap.has_pending());
    }
}
