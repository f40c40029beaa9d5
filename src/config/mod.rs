//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), one sub-config per remote stage
//! plus the HTTP listener, `AppPaths` for the platform config directory, and
//! TOML persistence via `AppConfig::load` / `AppConfig::save_to`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    ApiConfig, AppConfig, ChatConfig, ServerConfig, SttConfig, TtsConfig, API_KEY_ENV,
    CONFIG_PATH_ENV,
};
