//! Scripted completion service for tests.
//!
//! Replays a fixed sequence of replies in call order and records every request,
//! so tests can drive the regeneration loop without network access.

use super::{ChatMessage, Completion, CompletionService, LlmError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Default)]
pub struct ScriptedService {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(text.to_string()));
        self
    }

    /// Queue a failure; it surfaces as `LlmError::RequestFailed`
    pub fn fail(self, message: &str) -> Self {
        self.push(Err(message.to_string()));
        self
    }

    fn push(&self, reply: Result<String, String>) {
        self.replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(reply);
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    async fn complete(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<Completion, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                system_prompt: system_prompt.to_string(),
                messages: messages.to_vec(),
            });

        let next = self
            .replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();

        match next {
            Some(Ok(text)) => Ok(Completion::new(text)),
            Some(Err(message)) => Err(LlmError::RequestFailed(message)),
            None => Err(LlmError::RequestFailed("No scripted reply left".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
