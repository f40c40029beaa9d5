//! Chat message types shared by the store, the chat gateway and the HTTP API.

use serde::{Deserialize, Serialize};

/// Author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One immutable entry of the chat transcript.
///
/// Serialises as `{"role": "user", "content": "..."}`, the same shape the
/// chat-completions wire format uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Why a message sequence cannot be sent to the chat stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("messages are required")]
    Empty,
    #[error("the last message must come from the user, found {0}")]
    LastNotUser(&'static str),
}

/// Check that `history` is a sequence the chat stage can answer: non-empty
/// and ending with the user utterance to reply to.
pub fn validate_history(history: &[ChatMessage]) -> Result<(), HistoryError> {
    match history.last() {
        None => Err(HistoryError::Empty),
        Some(last) if last.role != Role::User => Err(HistoryError::LastNotUser(last.role.as_str())),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serialises_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let parsed: Result<ChatMessage, _> =
            serde_json::from_str(r#"{"role":"system","content":"x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn empty_history_is_invalid() {
        assert_eq!(validate_history(&[]), Err(HistoryError::Empty));
    }

    #[test]
    fn history_ending_with_assistant_is_invalid() {
        let history = [ChatMessage::user("q"), ChatMessage::assistant("a")];
        assert_eq!(
            validate_history(&history),
            Err(HistoryError::LastNotUser("assistant"))
        );
    }

    #[test]
    fn history_ending_with_user_is_valid() {
        let history = [
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
        ];
        assert!(validate_history(&history).is_ok());
    }
}
