//! Chat-completion gateway.
//!
//! [`ApiCompleter`] calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint.  The request is the synthesized system instruction followed by
//! the history exactly as given; the newest user utterance is the last
//! history entry.

use async_trait::async_trait;

use crate::config::{ApiConfig, ChatConfig};
use crate::conversation::{validate_history, ChatMessage};

use super::{authorize, endpoint, ensure_success, http_client, GatewayError};

/// Async trait for chat-completion backends.
///
/// # Arguments
/// * `system_instruction` – built from the lecture context, never stored.
/// * `history` – ordered transcript ending with the user message to answer.
///
/// Returns `Err(InvalidInput)` for an empty history or one that does not end
/// with a user message, and `Err(Upstream)` when the service fails or its
/// reply carries no text.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(
        &self,
        system_instruction: &str,
        history: &[ChatMessage],
    ) -> Result<String, GatewayError>;
}

/// OpenAI-compatible chat-completions client.
pub struct ApiCompleter {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    config: ChatConfig,
}

impl ApiCompleter {
    pub fn from_config(api: &ApiConfig, chat: &ChatConfig) -> Self {
        Self {
            client: http_client(api),
            url: endpoint(api, "chat/completions"),
            api_key: api.api_key.clone(),
            config: chat.clone(),
        }
    }

    fn request_body(&self, system_instruction: &str, history: &[ChatMessage]) -> serde_json::Value {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(serde_json::json!({ "role": "system", "content": system_instruction }));
        messages.extend(
            history
                .iter()
                .map(|m| serde_json::json!({ "role": m.role.as_str(), "content": m.content })),
        );

        let mut body = serde_json::json!({
            "model":    self.config.model,
            "messages": messages,
            "stream":   false,
        });
        if let Some(t) = self.config.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        body
    }
}

/// Pull `choices[0].message.content` out of a completion response.
fn extract_reply(json: &serde_json::Value) -> Result<String, GatewayError> {
    let reply = json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .unwrap_or_default();

    if reply.is_empty() {
        return Err(GatewayError::Upstream("completion returned no reply text".into()));
    }
    Ok(reply.to_string())
}

#[async_trait]
impl ChatCompleter for ApiCompleter {
    async fn complete(
        &self,
        system_instruction: &str,
        history: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        validate_history(history).map_err(|e| GatewayError::InvalidInput(e.to_string()))?;

        log::debug!(
            "chat: sending {} messages to {} (model {})",
            history.len() + 1,
            self.url,
            self.config.model
        );

        let body = self.request_body(system_instruction, history);
        let req = authorize(self.client.post(&self.url), self.api_key.as_deref()).json(&body);
        let response = ensure_success("chat", req.send().await?).await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Upstream(format!("failed to parse completion: {e}")))?;

        let reply = extract_reply(&json)?;
        log::info!("chat: reply of {} chars", reply.chars().count());
        Ok(reply)
    }
}
