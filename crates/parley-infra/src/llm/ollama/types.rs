//! Ollama native chat API types.
//!
//! Wire shapes for `POST /api/chat`. These are Ollama-specific and distinct
//! from the provider-agnostic types in parley-types.

use serde::{Deserialize, Serialize};

/// Request body for `/api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaMessage>,
    /// Always `false`: one JSON object per reply.
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaMessage {
    pub role: String,
    pub content: String,
}

/// Model runtime options. Only the knobs Parley exposes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

impl OllamaOptions {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.num_predict.is_none()
    }
}

/// Non-streaming response from `/api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaChatResponse {
    pub model: String,
    pub message: OllamaMessage,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

/// Error body returned alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_skips_empty_options() {
        let req = OllamaChatRequest {
            model: "gemma3:4b".to_string(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            stream: false,
            options: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["stream"], false);
        assert!(json.get("options").is_none());
    }

    #[test]
    fn test_response_parses_counts() {
        let json = r#"{
            "model": "gemma3:4b",
            "created_at": "2025-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": "Hello!"},
            "done": true,
            "prompt_eval_count": 12,
            "eval_count": 3
        }"#;
        let resp: OllamaChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.message.content, "Hello!");
        assert_eq!(resp.prompt_eval_count, Some(12));
        assert_eq!(resp.eval_count, Some(3));
        assert!(resp.done);
    }
}
