//! In-memory lecture context and chat history.
//!
//! [`ConversationStore`] is the single instance holding everything a turn
//! reads or writes.  It is shared by handle (`Arc<ConversationStore>`) between
//! the turn orchestrator and the HTTP layer; there is no global.
//!
//! Access discipline:
//! * only the turn orchestrator calls [`append`](ConversationStore::append);
//! * only the context-editing surface calls
//!   [`set_context`](ConversationStore::set_context).
//!
//! Both halves live behind one mutex, so every append is totally ordered and
//! visible to the next read from any task.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::message::{ChatMessage, Role};

#[derive(Debug, Default)]
struct Inner {
    context: String,
    history: Vec<ChatMessage>,
}

/// Lecture context plus append-only chat history.
///
/// ```rust
/// use lecture_voice::conversation::{ConversationStore, Role};
///
/// let store = ConversationStore::new();
/// store.set_context("Newton's laws...");
/// store.append(Role::User, "What is inertia?");
/// assert_eq!(store.len(), 1);
/// store.clear();
/// assert!(store.is_empty());
/// assert_eq!(store.get_context(), "Newton's laws...");
/// ```
#[derive(Debug, Default)]
pub struct ConversationStore {
    inner: Mutex<Inner>,
}

impl ConversationStore {
    /// Empty context, empty history.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every critical section is a single assignment or push, so a
        // poisoned guard still holds consistent data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lecture context (empty string when never set).
    pub fn get_context(&self) -> String {
        self.lock().context.clone()
    }

    /// Replace the lecture context wholesale.
    pub fn set_context(&self, context: impl Into<String>) {
        let context = context.into();
        log::debug!("store: lecture context replaced ({} bytes)", context.len());
        self.lock().context = context;
    }

    /// Snapshot of the history in insertion order.
    pub fn get_history(&self) -> Vec<ChatMessage> {
        self.lock().history.clone()
    }

    /// Snapshot of at most the `n` most recent messages.
    pub fn recent_history(&self, n: usize) -> Vec<ChatMessage> {
        let inner = self.lock();
        let start = inner.history.len().saturating_sub(n);
        inner.history[start..].to_vec()
    }

    /// Append one message at the end of the history.
    ///
    /// `content` is stored as given.  The turn orchestrator passes the
    /// transcript trimmed of surrounding whitespace and the reply trimmed by
    /// the chat gateway, so history entries never start or end with blanks.
    pub fn append(&self, role: Role, content: impl Into<String>) {
        let mut inner = self.lock();
        inner.history.push(ChatMessage::new(role, content));
        log::debug!("store: appended {} message (#{})", role.as_str(), inner.history.len());
    }

    /// Empty the history.  The lecture context is left untouched.
    pub fn clear(&self) {
        self.lock().history.clear();
        log::debug!("store: history cleared");
    }

    /// Number of messages in the history.
    pub fn len(&self) -> usize {
        self.lock().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().history.is_empty()
    }
}
