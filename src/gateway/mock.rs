//! Test doubles for the three stage gateways.
//!
//! Each mock answers from a script (front to back), then repeats its
//! fallback answer, and records every call so tests can assert on what the
//! orchestrator sent.  The mocks enforce the same input contracts as the
//! real gateways.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::audio::{AudioBuffer, SYNTHESIS_ENCODING};
use crate::conversation::{validate_history, ChatMessage};

use super::{ChatCompleter, GatewayError, SpeechSynthesizer, Transcriber, VoiceProfile};

type Answer<T> = Result<T, GatewayError>;

struct Script<T: Clone> {
    queue: Mutex<VecDeque<Answer<T>>>,
    fallback: Answer<T>,
}

impl<T: Clone> Script<T> {
    fn new(queue: Vec<Answer<T>>, fallback: Answer<T>) -> Self {
        Self {
            queue: Mutex::new(queue.into()),
            fallback,
        }
    }

    fn next(&self) -> Answer<T> {
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

// ---------------------------------------------------------------------------
// MockTranscriber
// ---------------------------------------------------------------------------

pub struct MockTranscriber {
    script: Script<String>,
    gate: Option<Arc<Notify>>,
    /// `(byte length, language)` of every call.
    pub calls: Mutex<Vec<(usize, String)>>,
}

impl MockTranscriber {
    pub fn ok(text: &str) -> Self {
        Self::script(Vec::new(), Ok(text.to_string()))
    }

    pub fn err(error: GatewayError) -> Self {
        Self::script(Vec::new(), Err(error))
    }

    pub fn script(queue: Vec<Answer<String>>, fallback: Answer<String>) -> Self {
        Self {
            script: Script::new(queue, fallback),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Like [`ok`](Self::ok) but each call waits for `gate` to be notified.
    pub fn gated(text: &str, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::ok(text)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &AudioBuffer, language: &str) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((audio.len(), language.to_string()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if audio.is_empty() {
            return Err(GatewayError::InvalidInput("audio buffer is empty".into()));
        }
        self.script.next()
    }
}

// ---------------------------------------------------------------------------
// MockCompleter
// ---------------------------------------------------------------------------

pub struct MockCompleter {
    script: Script<String>,
    /// `(system instruction, history)` of every call.
    pub calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl MockCompleter {
    pub fn ok(reply: &str) -> Self {
        Self::script(Vec::new(), Ok(reply.to_string()))
    }

    pub fn err(error: GatewayError) -> Self {
        Self::script(Vec::new(), Err(error))
    }

    pub fn script(queue: Vec<Answer<String>>, fallback: Answer<String>) -> Self {
        Self {
            script: Script::new(queue, fallback),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<(String, Vec<ChatMessage>)> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatCompleter for MockCompleter {
    async fn complete(
        &self,
        system_instruction: &str,
        history: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_instruction.to_string(), history.to_vec()));
        validate_history(history).map_err(|e| GatewayError::InvalidInput(e.to_string()))?;
        self.script.next()
    }
}

// ---------------------------------------------------------------------------
// MockSynthesizer
// ---------------------------------------------------------------------------

pub struct MockSynthesizer {
    script: Script<Vec<u8>>,
    /// Text of every call.
    pub calls: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn ok(audio: &[u8]) -> Self {
        Self {
            script: Script::new(Vec::new(), Ok(audio.to_vec())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn err(error: GatewayError) -> Self {
        Self {
            script: Script::new(Vec::new(), Err(error)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &VoiceProfile) -> Result<AudioBuffer, GatewayError> {
        self.calls.lock().unwrap().push(text.to_string());
        if text.trim().is_empty() {
            return Err(GatewayError::InvalidInput("text is required".into()));
        }
        self.script
            .next()
            .map(|bytes| AudioBuffer::new(bytes, SYNTHESIS_ENCODING))
    }
}
