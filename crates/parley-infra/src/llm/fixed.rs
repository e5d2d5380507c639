//! Canned-reply provider.
//!
//! Answers every request with the same text and never touches the network.
//! Selected with `provider = "fixed"` for offline runs and demos.

use parley_core::llm::provider::LlmProvider;
use parley_observe::genai_attrs;
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

#[derive(Debug, Clone)]
pub struct FixedReplyProvider {
    reply: String,
}

impl FixedReplyProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl LlmProvider for FixedReplyProvider {
    fn name(&self) -> &str {
        genai_attrs::PROVIDER_FIXED
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: self.reply.clone(),
            model: if request.model.is_empty() {
                "fixed".to_string()
            } else {
                request.model.clone()
            },
            usage: Usage::default(),
        })
    }
}
