//! Application entry point — lecture voice assistant server.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] (defaults on first run, `$OPENAI_API_KEY` fills a
//!    missing key).
//! 3. Build the three HTTP gateways from config.
//! 4. Create the conversation store and the turn orchestrator.
//! 5. Serve the API until the process is stopped.

use std::sync::Arc;

use lecture_voice::{
    config::AppConfig,
    conversation::ConversationStore,
    gateway::Gateways,
    pipeline::{new_shared_state, TurnOrchestrator, TurnSettings},
    server::{self, ApiState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Lecture voice assistant starting…");

    // 2. Config
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        let mut config = AppConfig::default();
        config.apply_env_api_key(std::env::var(lecture_voice::config::API_KEY_ENV).ok());
        config
    });

    if config.api.api_key.is_none() {
        log::warn!(
            "No API key configured; requests to {} will be unauthenticated",
            config.api.base_url
        );
    }
    log::info!(
        "Models: stt={} chat={} tts={} (voice {})",
        config.stt.model,
        config.chat.model,
        config.tts.model,
        config.tts.voice
    );

    // 3. Gateways
    let gateways = Gateways::from_config(&config);

    // 4. Store + orchestrator
    let store = Arc::new(ConversationStore::new());
    let orchestrator = Arc::new(TurnOrchestrator::new(
        new_shared_state(),
        Arc::clone(&store),
        gateways.clone(),
        TurnSettings::from_config(&config),
    ));
    let state = Arc::new(ApiState::new(orchestrator, store, gateways));

    // 5. Serve
    server::serve(&config.server, state).await?;

    log::info!("Lecture voice assistant stopped.");
    Ok(())
}
