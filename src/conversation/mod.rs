//! Conversation state: lecture context, chat history and the system
//! instruction derived from them.
//!
//! * [`ConversationStore`] — single in-memory store shared by handle.
//! * [`ChatMessage`] / [`Role`] — immutable transcript entries.
//! * [`PromptBuilder`] — fallback / grounded system instruction templates.
//! * [`validate_history`] — precondition checked before every completion.

pub mod message;
pub mod prompt;
pub mod store;

pub use message::{validate_history, ChatMessage, HistoryError, Role};
pub use prompt::PromptBuilder;
pub use store::ConversationStore;
