//! LLM provider implementations.
//!
//! Concrete implementations of the [`LlmProvider`](parley_core::llm::provider::LlmProvider)
//! trait defined in `parley-core`, plus a factory ([`create_provider`]) that
//! builds the configured one.

pub mod fixed;
pub mod ollama;
pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;

use parley_core::llm::box_provider::BoxLlmProvider;
use parley_types::config::{DEFAULT_OLLAMA_HOST, LlmConfig};
use parley_types::llm::{LlmError, ProviderType};

use self::fixed::FixedReplyProvider;
use self::ollama::OllamaProvider;
use self::openai_compat::{OPENAI_BASE_URL, OpenAiCompatibleProvider};

/// Create a [`BoxLlmProvider`] from the `[llm]` section.
///
/// The API key, when `api_key_env` names a variable, is read from the
/// environment here and never stored in the config itself.
///
/// # Errors
///
/// Returns [`LlmError::InvalidRequest`] if `api_key_env` names a variable
/// that is unset, or a provider error if the HTTP client cannot be built.
pub fn create_provider(config: &LlmConfig) -> Result<BoxLlmProvider, LlmError> {
    let api_key = resolve_api_key(config.api_key_env.as_deref(), |name| {
        std::env::var(name).ok()
    })?;

    match config.provider {
        ProviderType::Ollama => {
            let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_OLLAMA_HOST);
            let provider = OllamaProvider::new(
                base_url,
                config.model.clone(),
                api_key,
                Duration::from_secs(config.timeout_secs),
            )?;
            tracing::debug!(base_url, model = %config.model, "configured ollama provider");
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderType::OpenAiCompatible => {
            let base_url = config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);
            let provider =
                OpenAiCompatibleProvider::new(base_url, api_key.as_ref(), config.model.clone());
            tracing::debug!(base_url, model = %config.model, "configured openai-compatible provider");
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderType::Fixed => Ok(BoxLlmProvider::new(FixedReplyProvider::new(
            config.fixed_reply.clone(),
        ))),
    }
}

fn resolve_api_key<F>(env_name: Option<&str>, lookup: F) -> Result<Option<SecretString>, LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(name) = env_name else {
        return Ok(None);
    };
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(Some(SecretString::from(value))),
        _ => Err(LlmError::InvalidRequest(format!(
            "API key environment variable {name} is not set"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_create_provider_default_is_ollama() {
        let provider = create_provider(&LlmConfig::default()).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_create_provider_openai_compatible() {
        let config = LlmConfig {
            provider: ProviderType::OpenAiCompatible,
            base_url: Some("http://localhost:11434/v1".to_string()),
            ..LlmConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai_compatible");
    }

    #[tokio::test]
    async fn test_create_provider_fixed_replies_with_configured_text() {
        let config = LlmConfig {
            provider: ProviderType::Fixed,
            fixed_reply: "Hello from the LLM".to_string(),
            ..LlmConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "fixed");

        let resp = provider
            .complete(&parley_types::llm::CompletionRequest {
                model: String::new(),
                messages: vec![parley_types::session::Turn::user("hi")],
                system: None,
                max_tokens: None,
                temperature: None,
            })
            .await
            .unwrap();
        assert_eq!(resp.content, "Hello from the LLM");
    }

    #[test]
    fn test_create_provider_missing_key_env_is_error() {
        let config = LlmConfig {
            provider: ProviderType::OpenAiCompatible,
            api_key_env: Some("PARLEY_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..LlmConfig::default()
        };
        match create_provider(&config) {
            Err(LlmError::InvalidRequest(msg)) => {
                assert!(msg.contains("PARLEY_TEST_KEY_THAT_IS_NEVER_SET"))
            }
            Err(other) => panic!("Expected InvalidRequest, got: {other}"),
            Ok(_) => panic!("Expected error but got Ok"),
        }
    }

    #[test]
    fn test_resolve_api_key() {
        assert!(resolve_api_key(None, |_| None).unwrap().is_none());

        let key = resolve_api_key(Some("KEY"), |_| Some("sk-123".to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(key.expose_secret(), "sk-123");

        assert!(resolve_api_key(Some("KEY"), |_| Some(String::new())).is_err());
    }
}
