//! OpenAI-compatible LLM provider implementation.
//!
//! Serves any chat completions API that speaks the OpenAI wire format:
//! OpenAI itself, Ollama's `/v1` endpoint, vLLM, LM Studio and similar.
//!
//! Uses [`async_openai`] for type-safe request/response handling.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::provider::LlmProvider;
use parley_observe::genai_attrs;
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};
use parley_types::session::Role;

/// Default base URL when `[llm].base_url` is unset.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider for any OpenAI-compatible chat completions API.
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompatibleProvider {
    /// Create a provider for `base_url`. Without a key, requests carry an
    /// empty bearer token, which local servers accept.
    pub fn new(base_url: &str, api_key: Option<&SecretString>, model: impl Into<String>) -> Self {
        let key = api_key.map(|k| k.expose_secret()).unwrap_or_default();
        let openai_config = OpenAIConfig::new()
            .with_api_key(key)
            .with_api_base(base_url.trim_end_matches('/'));

        Self {
            client: Client::with_config(openai_config),
            model: model.into(),
        }
    }

    /// Build a [`CreateChatCompletionRequest`] from a generic [`CompletionRequest`].
    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref system) = request.system {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(system.clone()),
                    name: None,
                },
            ));
        }

        for turn in &request.messages {
            let oai_msg = match turn.role {
                Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(turn.content.clone()),
                    name: None,
                }),
                Role::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            turn.content.clone(),
                        )),
                        refusal: None,
                        name: None,
                        audio: None,
                        tool_calls: None,
                        function_call: None,
                    })
                }
            };
            messages.push(oai_msg);
        }

        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: request.max_tokens,
            temperature: request.temperature.map(|t| t as f32),
            ..Default::default()
        }
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        genai_attrs::PROVIDER_OPENAI_COMPATIBLE
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let oai_request = self.build_request(request);
        let requested_model = oai_request.model.clone();

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(|e| map_openai_error(e, &requested_model))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: response.model,
            usage,
        })
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError, model: &str) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Invalid API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "model_not_found" {
                LlmError::ModelNotFound(model.to_string())
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if code == "server_error" || error_type == "overloaded_error" {
                LlmError::Overloaded(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401 | 403) => LlmError::AuthenticationFailed,
            Some(404) => LlmError::ModelNotFound(model.to_string()),
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            Some(503 | 529) => LlmError::Overloaded(err.to_string()),
            _ => LlmError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::session::Turn;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(turns: Vec<Turn>) -> CompletionRequest {
        CompletionRequest {
            model: String::new(),
            messages: turns,
            system: Some("be brief".to_string()),
            max_tokens: Some(64),
            temperature: Some(0.5),
        }
    }

    #[test]
    fn test_build_request_maps_roles_and_defaults_model() {
        let provider = OpenAiCompatibleProvider::new(OPENAI_BASE_URL, None, "gpt-4o-mini");
        let req = provider.build_request(&request(vec![
            Turn::user("q"),
            Turn::assistant("a"),
            Turn::user("q2"),
        ]));

        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.max_completion_tokens, Some(64));
        assert_eq!(req.messages.len(), 4);
        assert!(matches!(req.messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(req.messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(req.messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(req.messages[3], ChatCompletionRequestMessage::User(_)));
    }

    #[tokio::test]
    async fn test_complete_against_stub_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 1_700_000_000u32,
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "hi there"},
                    "finish_reason": "stop",
                    "logprobs": null
                }],
                "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let key = SecretString::from("sk-test");
        let provider = OpenAiCompatibleProvider::new(
            &format!("{}/v1", server.uri()),
            Some(&key),
            "gpt-4o-mini",
        );
        let resp = provider.complete(&request(vec![Turn::user("hello")])).await.unwrap();

        assert_eq!(resp.content, "hi there");
        assert_eq!(resp.model, "gpt-4o-mini");
        assert_eq!(resp.usage.input_tokens, 5);
        assert_eq!(resp.usage.output_tokens, 2);
    }

    #[tokio::test]
    async fn test_bad_key_maps_to_authentication_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {
                    "message": "Incorrect API key provided",
                    "type": "invalid_request_error",
                    "param": null,
                    "code": "invalid_api_key"
                }
            })))
            .mount(&server)
            .await;

        let provider =
            OpenAiCompatibleProvider::new(&format!("{}/v1", server.uri()), None, "gpt-4o-mini");
        let err = provider
            .complete(&request(vec![Turn::user("hello")]))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationFailed), "got: {err}");
    }

    #[test]
    fn test_provider_name() {
        let provider = OpenAiCompatibleProvider::new("http://localhost:11434/v1", None, "m");
        assert_eq!(provider.name(), "openai_compatible");
    }
}
