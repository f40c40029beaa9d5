//! Encoded audio buffers and the single-slot holder used to hand them over.
//!
//! [`AudioBuffer`] is opaque: the server never decodes audio, it only carries
//! the bytes and the MIME type between the browser and the remote stages.
//!
//! [`PendingSlot`] holds at most one value.  Putting into an occupied slot is
//! refused (the value is handed back), and [`take`](PendingSlot::take) moves
//! the value out, leaving the slot empty.
//!
//! # Example
//!
//! ```rust
//! use lecture_voice::audio::{AudioBuffer, PendingSlot};
//!
//! let mut slot = PendingSlot::new();
//! slot.put(AudioBuffer::new(vec![1, 2, 3], "audio/webm")).unwrap();
//! assert!(slot.put(AudioBuffer::new(vec![4], "audio/webm")).is_err());
//! assert_eq!(slot.take().map(|b| b.len()), Some(3));
//! assert!(slot.take().is_none());
//! ```

/// Encoding used when the uploader does not say.
pub const DEFAULT_CAPTURE_ENCODING: &str = "audio/webm";

/// Encoding of everything the synthesis stage returns.
pub const SYNTHESIS_ENCODING: &str = "audio/mpeg";

// ---------------------------------------------------------------------------
// AudioBuffer
// ---------------------------------------------------------------------------

/// Encoded audio bytes tagged with their MIME type.
///
/// Deliberately not `Clone`: a buffer is moved from the capture controller to
/// the orchestrator and from the orchestrator to the playback controller.
#[derive(Debug, PartialEq, Eq)]
pub struct AudioBuffer {
    data: Vec<u8>,
    encoding: String,
}

impl AudioBuffer {
    /// Wrap `data`.  Parameters after `;` in `encoding` (e.g. `codecs=opus`)
    /// are kept as given.
    pub fn new(data: Vec<u8>, encoding: impl Into<String>) -> Self {
        Self {
            data,
            encoding: encoding.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Full MIME type as supplied, e.g. `audio/webm;codecs=opus`.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// MIME type without parameters, lower-cased.
    pub fn mime_essence(&self) -> String {
        self.encoding
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// File name the transcription API uses to sniff the container format.
    pub fn file_name(&self) -> &'static str {
        match self.mime_essence().as_str() {
            "audio/mpeg" | "audio/mp3" => "audio.mp3",
            "audio/wav" | "audio/wave" | "audio/x-wav" => "audio.wav",
            "audio/ogg" => "audio.ogg",
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "audio.m4a",
            "audio/flac" => "audio.flac",
            _ => "audio.webm",
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ---------------------------------------------------------------------------
// PendingSlot
// ---------------------------------------------------------------------------

/// A holder for at most one value with move-out semantics.
#[derive(Debug)]
pub struct PendingSlot<T> {
    value: Option<T>,
}

impl<T> PendingSlot<T> {
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Store `value`.  Returns it back unchanged when the slot is occupied.
    pub fn put(&mut self, value: T) -> Result<(), T> {
        if self.value.is_some() {
            return Err(value);
        }
        self.value = Some(value);
        Ok(())
    }

    /// Move the value out, leaving the slot empty.
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    pub fn is_occupied(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Default for PendingSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
