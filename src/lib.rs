//! Lecture voice assistant.
//!
//! A student asks a question aloud; the server transcribes it, answers from
//! the lecture text supplied by the instructor and speaks the answer back.
//!
//! * [`audio`] — capture / playback controllers and encoded buffers.
//! * [`config`] — TOML settings.
//! * [`conversation`] — lecture context, chat history, system instruction.
//! * [`gateway`] — speech-to-text, chat-completion and text-to-speech clients.
//! * [`pipeline`] — the turn state machine and its orchestrator.
//! * [`server`] — axum HTTP API.

pub mod audio;
pub mod config;
pub mod conversation;
pub mod gateway;
pub mod pipeline;
pub mod server;
