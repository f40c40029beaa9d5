//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every field has a serde default, so a partial `settings.toml` only needs
//! to name the values it overrides.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable consulted when `api.api_key` is not set in the file.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable that overrides the location of `settings.toml`.
pub const CONFIG_PATH_ENV: &str = "LECTURE_VOICE_CONFIG";

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Connection settings shared by the three remote stage gateways.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the OpenAI-compatible API (no trailing `/v1`).
    ///
    /// - OpenAI: `https://api.openai.com`
    /// - Local gateways (LiteLLM, vLLM …): e.g. `http://localhost:4000`
    pub base_url: String,
    /// Bearer token.  `None` falls back to `$OPENAI_API_KEY` at load time.
    pub api_key: Option<String>,
    /// Maximum seconds to wait for any single remote call.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-to-text stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Transcription model identifier.
    pub model: String,
    /// Fixed language hint as an ISO-639-1 code.  Also selects the language
    /// of the system instruction templates.
    pub language: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "whisper-1".into(),
            language: "ja".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChatConfig
// ---------------------------------------------------------------------------

/// Settings for the chat-completion stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Model identifier sent to the API (e.g. `"gpt-4o"`).
    pub model: String,
    /// Sampling temperature.  `None` leaves the provider default in place.
    pub temperature: Option<f32>,
    /// Number of most-recent history messages sent with each completion.
    ///
    /// `None` sends the whole transcript.  The stored history is never
    /// truncated; only the request is windowed.
    pub history_window: Option<usize>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            temperature: None,
            history_window: None,
        }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-synthesis stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub model: String,
    /// Voice profile name (e.g. `"alloy"`).
    pub voice: String,
    /// Playback speed multiplier (0.25 – 4.0).
    pub speed: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: "tts-1".into(),
            voice: "alloy".into(),
            speed: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the API listens on.
    pub bind: String,
    /// Largest accepted request body in bytes (audio uploads).
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".into(),
            // Matches the 25 MB upload ceiling of the transcription API.
            max_body_bytes: 25 * 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use lecture_voice::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// println!("listening on {}", config.server.bind);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub stt: SttConfig,
    pub chat: ChatConfig,
    pub tts: TtsConfig,
}

impl AppConfig {
    /// Load configuration from `$LECTURE_VOICE_CONFIG` or, when unset, the
    /// platform-appropriate `settings.toml`.
    ///
    /// Returns defaults when the file does not exist yet, then fills a
    /// missing API key from `$OPENAI_API_KEY`.
    pub fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(p) => p.into(),
            None => AppPaths::new().settings_file,
        };
        let mut config = Self::load_from(&path)?;
        config.apply_env_api_key(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        log::info!("config: loaded {}", path.display());
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Use `env_key` as the API key unless the file already provides a
    /// non-empty one.
    pub fn apply_env_api_key(&mut self, env_key: Option<String>) {
        let has_key = self.api.api_key.as_deref().is_some_and(|k| !k.is_empty());
        if !has_key {
            if let Some(key) = env_key.filter(|k| !k.is_empty()) {
                self.api.api_key = Some(key);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
