//! Prompt-completion service abstraction.
//!
//! The regeneration loop and the enhancer only see [`CompletionService`];
//! [`OpenRouterClient`] talks to the real API and [`ScriptedService`] replays
//! canned replies in tests.

mod fake;
mod openrouter;

pub use fake::{RecordedCall, ScriptedService};
pub use openrouter::{estimate_cost_usd, OpenRouterClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for completion calls.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Service temporarily unavailable (circuit open)")]
    CircuitOpen,

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    /// Stored roles other than `user` and `system` are treated as assistant turns
    pub fn parse(value: &str) -> Self {
        match value {
            "user" => ChatRole::User,
            "system" => ChatRole::System,
            _ => ChatRole::Assistant,
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of a conversation sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// A model reply
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub total_tokens: u64,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            total_tokens: 0,
        }
    }
}

/// Trait for prompt-completion services.
///
/// Implementations must be thread-safe; one instance is shared by every chat.
#[async_trait]
pub trait CompletionService: Send + Sync + fmt::Debug {
    /// Complete `messages` under `system_prompt`.
    async fn complete(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<Completion, LlmError>;

    /// Model name used for completions
    fn model_name(&self) -> &str;
}
