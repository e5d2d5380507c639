//! Application state wiring the chat service together.
//!
//! AppState holds the concrete service instance used by both the CLI and the
//! REST API. `ChatService` is generic over the session store; AppState pins
//! it to the runtime-selected [`SessionBackend`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use parley_core::chat::service::{ChatService, ExchangeSettings};
use parley_infra::backend::SessionBackend;
use parley_infra::llm::create_provider;
use parley_types::config::AppConfig;

pub type ConcreteChatService = ChatService<SessionBackend>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Open the configured store and responder and wire the chat service.
    pub async fn init(config: &AppConfig, data_dir: PathBuf) -> anyhow::Result<Self> {
        let store = SessionBackend::from_config(&config.storage, &data_dir).await?;
        let provider =
            create_provider(&config.llm).context("failed to configure the LLM provider")?;
        let settings = ExchangeSettings::from_config(&config.llm, &config.chat);

        tracing::info!(
            provider = provider.name(),
            model = %settings.model,
            backend = ?store.kind(),
            "chat service ready"
        );

        let chat_service = ChatService::new(Arc::new(store), provider, settings);
        Ok(Self::from_parts(chat_service, data_dir))
    }

    pub fn from_parts(chat_service: ConcreteChatService, data_dir: PathBuf) -> Self {
        Self {
            chat_service: Arc::new(chat_service),
            data_dir,
        }
    }
}
