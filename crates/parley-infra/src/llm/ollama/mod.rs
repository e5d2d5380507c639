//! OllamaProvider -- [`LlmProvider`] for Ollama's native chat endpoint.
//!
//! Sends the whole conversation to `POST {base_url}/api/chat` with
//! `stream: false` and returns the single assistant message.
//!
//! An optional bearer token (for Ollama behind an authenticating proxy) is
//! held as a [`SecretString`] and only exposed when building the request.

pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::provider::LlmProvider;
use parley_observe::genai_attrs;
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use self::types::{
    OllamaChatRequest, OllamaChatResponse, OllamaErrorResponse, OllamaMessage, OllamaOptions,
};

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl OllamaProvider {
    /// Create a provider talking to `base_url` (e.g. `http://localhost:11434`).
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn to_ollama_request(&self, request: &CompletionRequest) -> OllamaChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|turn| OllamaMessage {
            role: turn.role.to_string(),
            content: turn.content.clone(),
        }));

        let options = OllamaOptions {
            temperature: request.temperature,
            num_predict: request.max_tokens,
        };

        OllamaChatRequest {
            model: if request.model.is_empty() {
                self.model.clone()
            } else {
                request.model.clone()
            },
            messages,
            stream: false,
            options: (!options.is_empty()).then_some(options),
        }
    }
}

/// Map a non-2xx Ollama response to an [`LlmError`].
fn map_status(status: reqwest::StatusCode, body: &str, model: &str) -> LlmError {
    let detail = serde_json::from_str::<OllamaErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string());

    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        404 => LlmError::ModelNotFound(model.to_string()),
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        400 => LlmError::InvalidRequest(detail),
        503 => LlmError::Overloaded(detail),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {detail}"),
        },
    }
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        genai_attrs::PROVIDER_OLLAMA
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_ollama_request(request);
        let mut builder = self.client.post(self.url("/api/chat")).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout)
            } else {
                LlmError::Provider {
                    message: format!("HTTP request failed: {e}"),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &error_body, &body.model));
        }

        let ollama_resp: OllamaChatResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        Ok(CompletionResponse {
            content: ollama_resp.message.content,
            model: ollama_resp.model,
            usage: Usage {
                input_tokens: ollama_resp.prompt_eval_count.unwrap_or(0),
                output_tokens: ollama_resp.eval_count.unwrap_or(0),
            },
        })
    }
}
