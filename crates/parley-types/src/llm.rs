//! LLM request/response types for Parley.
//!
//! These types model the data shapes exchanged with a responder backend:
//! completion requests, responses, usage, and provider errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::session::Turn;

/// Request to an LLM provider for a single assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier. Empty means "use the provider's configured model".
    pub model: String,
    /// The full ordered conversation, ending with the newest user turn.
    pub messages: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

/// Token usage for a completion request/response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from LLM provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Type of LLM provider backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Ollama's native `/api/chat` endpoint.
    Ollama,
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
    /// Canned reply, no network.
    Fixed,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Ollama => write!(f, "ollama"),
            ProviderType::OpenAiCompatible => write!(f, "openai_compatible"),
            ProviderType::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(ProviderType::Ollama),
            "openai_compatible" => Ok(ProviderType::OpenAiCompatible),
            "fixed" => Ok(ProviderType::Fixed),
            other => Err(format!("invalid provider type: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_roundtrip() {
        for pt in [
            ProviderType::Ollama,
            ProviderType::OpenAiCompatible,
            ProviderType::Fixed,
        ] {
            let parsed: ProviderType = pt.to_string().parse().unwrap();
            assert_eq!(pt, parsed);
        }
    }

    #[test]
    fn test_provider_type_serde() {
        let json = serde_json::to_string(&ProviderType::OpenAiCompatible).unwrap();
        assert_eq!(json, "\"openai_compatible\"");
        let parsed: ProviderType = serde_json::from_str("\"ollama\"").unwrap();
        assert_eq!(parsed, ProviderType::Ollama);
    }

    #[test]
    fn test_request_skips_unset_options() {
        let request = CompletionRequest {
            model: "gemma3:4b".to_string(),
            messages: vec![Turn::user("hi")],
            system: None,
            max_tokens: None,
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::ModelNotFound("gemma3:4b".to_string());
        assert_eq!(err.to_string(), "model not found: gemma3:4b");
    }
}
