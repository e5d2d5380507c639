//! Configuration types for Parley.
//!
//! `AppConfig` represents the top-level `config.toml`. Every section and
//! field has a default, so an empty file (or no file) yields a working
//! local setup: SQLite storage under the data directory and an Ollama
//! responder on `localhost:11434`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::llm::ProviderType;

/// Default Ollama endpoint when neither the file nor `OLLAMA_HOST` set one.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Default model requested from the responder.
pub const DEFAULT_MODEL: &str = "gemma3:4b";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which session store backs the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    #[default]
    Sqlite,
    /// Process-local map; transcripts are lost on restart.
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// SQLite database file. Defaults to `{data_dir}/parley.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderType,
    /// Base URL of the provider API. For Ollama, falls back to `OLLAMA_HOST`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key, if any.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Upper bound on a single responder call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Reply text used by the `fixed` provider.
    #[serde(default = "default_fixed_reply")]
    pub fixed_reply: String,
}

fn default_provider() -> ProviderType {
    ProviderType::Ollama
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_fixed_reply() -> String {
    "Hello from the LLM".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            model: default_model(),
            api_key_env: None,
            system_prompt: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
            fixed_reply: default_fixed_reply(),
        }
    }
}

/// What happens to the already-appended user turn when the responder fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponderFailurePolicy {
    /// Persist nothing; the stored transcript is left as it was.
    #[default]
    Discard,
    /// Persist the transcript including the unanswered user turn.
    PersistUserTurn,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub on_responder_failure: ResponderFailurePolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Bridge spans to OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.backend, StorageBackendKind::Sqlite);
        assert!(config.storage.path.is_none());
        assert_eq!(config.llm.provider, ProviderType::Ollama);
        assert_eq!(config.llm.model, "gemma3:4b");
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(
            config.chat.on_responder_failure,
            ResponderFailurePolicy::Discard
        );
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(!config.logging.otel);
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
[server]
port = 9000

[storage]
backend = "memory"

[llm]
provider = "openai_compatible"
base_url = "http://localhost:11434/v1"
model = "llama3.2"
api_key_env = "OPENAI_API_KEY"
temperature = 0.2
timeout_secs = 30

[chat]
on_responder_failure = "persist_user_turn"

[logging]
format = "json"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.backend, StorageBackendKind::Memory);
        assert_eq!(config.llm.provider, ProviderType::OpenAiCompatible);
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(config.llm.api_key_env.as_deref(), Some("OPENAI_API_KEY"));
        assert_eq!(config.llm.temperature, Some(0.2));
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(
            config.chat.on_responder_failure,
            ResponderFailurePolicy::PersistUserTurn
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result: Result<AppConfig, _> = toml::from_str(
            r#"
[chat]
on_responder_failure = "retry"
"#,
        );
        assert!(result.is_err());
    }
}
