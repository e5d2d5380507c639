//! Chat service orchestrating one exchange per call.
//!
//! ChatService owns the process-wide collaborators (the session store and the
//! responder) and builds a fresh `SessionManager` handle for every exchange.
//! The store is touched only when the session is created or loaded and when
//! it is saved; the responder call in between holds no store lock.

use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, info, info_span, warn};

use parley_observe::genai_attrs;
use parley_types::config::{ChatConfig, LlmConfig, ResponderFailurePolicy};
use parley_types::error::ChatError;
use parley_types::llm::CompletionRequest;
use parley_types::session::{SessionId, SessionRecord, Turn};

use crate::llm::box_provider::BoxLlmProvider;
use crate::session::manager::SessionManager;
use crate::session::store::SessionStore;

/// Per-process knobs applied to every exchange.
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub model: String,
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Upper bound on one responder call.
    pub timeout: Duration,
    pub failure_policy: ResponderFailurePolicy,
}

impl ExchangeSettings {
    pub fn from_config(llm: &LlmConfig, chat: &ChatConfig) -> Self {
        Self {
            model: llm.model.clone(),
            system_prompt: llm.system_prompt.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            timeout: Duration::from_secs(llm.timeout_secs),
            failure_policy: chat.on_responder_failure,
        }
    }
}

/// The outcome of a successful exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub message: String,
    pub session_id: SessionId,
}

/// Runs chat exchanges against a shared store and responder.
///
/// Generic over `SessionStore` to maintain clean architecture
/// (parley-core never depends on parley-infra).
pub struct ChatService<S: SessionStore> {
    store: Arc<S>,
    provider: BoxLlmProvider,
    settings: ExchangeSettings,
}

impl<S: SessionStore> ChatService<S> {
    pub fn new(store: Arc<S>, provider: BoxLlmProvider, settings: ExchangeSettings) -> Self {
        Self {
            store,
            provider,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn settings(&self) -> &ExchangeSettings {
        &self.settings
    }

    /// Run one exchange.
    ///
    /// Without a `session_id` a new session is created; with one, its
    /// transcript is loaded (an unknown id fails with `SessionNotFound`).
    /// The user turn and the assistant turn are appended in memory and saved
    /// together, so a successful exchange always ends the stored transcript
    /// with exactly that pair. When the responder fails, the configured
    /// [`ResponderFailurePolicy`] decides whether the unanswered user turn is
    /// saved; the responder error is returned either way, naming the session
    /// through [`ChatError::retained_session`] when the turn was kept. A new
    /// session whose first exchange fails without being saved leaves nothing
    /// in the store.
    pub async fn exchange(
        &self,
        message: String,
        session_id: Option<SessionId>,
    ) -> Result<ChatReply, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::InvalidMessage(
                "message must not be empty".to_string(),
            ));
        }

        let mut manager = SessionManager::new(self.store.clone());
        match &session_id {
            Some(id) => manager.load_session(id).await?,
            None => {
                manager.create_session().await?;
            }
        }
        let session_id = manager
            .session_id()
            .cloned()
            .ok_or_else(|| ChatError::Persistence("session manager is unbound".to_string()))?;

        manager.append(Turn::user(message))?;

        let reply = match self.respond(&session_id, manager.context()).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(session_id = %session_id, error = %err, "Responder failed");
                if self.settings.failure_policy != ResponderFailurePolicy::PersistUserTurn {
                    return Err(err);
                }
                return match manager.save_session().await {
                    Ok(()) => Err(err.with_retained_session(session_id)),
                    Err(save_err) => {
                        warn!(
                            session_id = %session_id,
                            error = %save_err,
                            "Failed to persist unanswered user turn"
                        );
                        Err(err)
                    }
                };
            }
        };

        manager.append(Turn::assistant(reply.clone()))?;
        manager.save_session().await?;

        info!(
            session_id = %session_id,
            turns = manager.context().len(),
            "Exchange completed"
        );

        Ok(ChatReply {
            message: reply,
            session_id,
        })
    }

    /// Fetch the stored transcript of a session.
    pub async fn transcript(&self, session_id: &SessionId) -> Result<SessionRecord, ChatError> {
        self.store
            .get(session_id)
            .await
            .map_err(|e| ChatError::Persistence(e.to_string()))?
            .ok_or_else(|| ChatError::SessionNotFound(session_id.clone()))
    }

    /// Number of stored sessions.
    pub async fn session_count(&self) -> Result<u64, ChatError> {
        self.store
            .count()
            .await
            .map_err(|e| ChatError::Persistence(e.to_string()))
    }

    /// Ask the responder for the next assistant turn, bounded by the timeout.
    async fn respond(
        &self,
        session_id: &SessionId,
        context: &[Turn],
    ) -> Result<String, ChatError> {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: context.to_vec(),
            system: self.settings.system_prompt.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.operation.name = genai_attrs::OP_CHAT,
            gen_ai.provider.name = self.provider.name(),
            gen_ai.conversation.id = %session_id,
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = ?request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        );

        let call = self.provider.complete(&request).instrument(span.clone());
        let response = tokio::time::timeout(self.settings.timeout, call)
            .await
            .map_err(|_| ChatError::ResponderTimeout {
                after: self.settings.timeout,
                retained: None,
            })??;

        span.record(genai_attrs::GEN_AI_USAGE_INPUT_TOKENS, response.usage.input_tokens);
        span.record(genai_attrs::GEN_AI_USAGE_OUTPUT_TOKENS, response.usage.output_tokens);

        Ok(response.content)
    }
}
