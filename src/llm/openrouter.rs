//! OpenRouter provider (OpenAI-compatible chat completions API).

use super::{ChatMessage, ChatRole, Completion, CompletionService, LlmError};
use crate::circuit_breaker::CircuitBreaker;
use crate::config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// USD per million tokens, rough figure for the default model
const COST_PER_MILLION_TOKENS: f64 = 0.75;

/// Rough cost estimate for a token count
pub fn estimate_cost_usd(tokens: u64) -> f64 {
    tokens as f64 * COST_PER_MILLION_TOKENS / 1_000_000.0
}

/// OpenRouter chat completion client.
#[derive(Debug)]
pub struct OpenRouterClient {
    config: LlmConfig,
    client: reqwest::Client,
    breaker: CircuitBreaker,
}

impl OpenRouterClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.recovery.request_timeout_secs))
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        Ok(Self {
            breaker: CircuitBreaker::new(config.recovery.clone()),
            config,
            client,
        })
    }

    /// Ask the vision model about an image given as a data URL
    pub async fn describe_image(&self, prompt: &str, image_data_url: &str, max_tokens: u32) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.config.vision_model,
            messages: vec![RequestMessage {
                role: ChatRole::User,
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_url.to_string(),
                        },
                    },
                ]),
            }],
            temperature: None,
            max_tokens,
        };

        let completion = self.send(&request).await?;
        Ok(completion.text)
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<Completion, LlmError> {
        if self.breaker.is_open() {
            warn!(model = request.model, "Circuit open, skipping completion request");
            return Err(LlmError::CircuitOpen);
        }

        let start = Instant::now();
        let result = self.send_once(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(completion) => {
                self.breaker.record_success();
                info!(
                    model = request.model,
                    tokens = completion.total_tokens,
                    duration_ms,
                    cost_usd = estimate_cost_usd(completion.total_tokens),
                    "LLM_SUCCESS"
                );
            }
            Err(e) => {
                self.breaker.record_failure();
                error!(model = request.model, duration_ms, error = %e, "LLM_ERROR");
            }
        }

        result
    }

    async fn send_once(&self, request: &ChatRequest<'_>) -> Result<Completion, LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.recovery.request_timeout_secs)
                } else {
                    LlmError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(LlmError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !(200..300).contains(&status) {
            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&body) {
                return Err(LlmError::ApiError {
                    status,
                    message: error_response.error.message,
                });
            }
            return Err(LlmError::ApiError { status, message: body });
        }

        let response: ChatResponse = serde_json::from_str(&body).map_err(|e| LlmError::ParseError(e.to_string()))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::ParseError("No choices in response".to_string()))?;

        Ok(Completion {
            text,
            total_tokens: response.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}

#[async_trait]
impl CompletionService for OpenRouterClient {
    async fn complete(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<Completion, LlmError> {
        let mut request_messages = Vec::with_capacity(messages.len() + 1);
        request_messages.push(RequestMessage {
            role: ChatRole::System,
            content: MessageContent::Text(system_prompt.to_string()),
        });
        request_messages.extend(messages.iter().map(|message| RequestMessage {
            role: message.role,
            content: MessageContent::Text(message.content.clone()),
        }));

        let request = ChatRequest {
            model: &self.config.model,
            messages: request_messages,
            temperature: Some(self.config.temperature),
            max_tokens: self.config.max_tokens,
        };

        self.send(&request).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Chat completion request format.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: ChatRole,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// Chat completion response format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}
