//! # Regeneration Loop
//!
//! Drives recipe generation as a small state machine: draft, verify, retry
//! with hints while attempts remain, and fall back to the enhancer once they
//! run out.

use serde::Serialize;
use tracing::{info, warn};

use crate::db::UserProfile;
use crate::enhancer::enhance_recipe;
use crate::llm::{ChatMessage, CompletionService, LlmError};
use crate::prompts::{regeneration_note, SYSTEM_PROMPT};
use crate::recipe_parser::looks_like_recipe;
use crate::verification::{regeneration_hints, verify_recipe, VerificationResult};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenerationState {
    /// Generating and verifying draft number `n` (1-indexed)
    Attempt(u32),
    Accepted,
    /// Attempts exhausted; the enhancer produced (or declined to change) the final text
    Enhanced,
    /// Not even a first draft could be produced
    Failed,
}

impl GenerationState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GenerationState::Attempt(_))
    }

    /// Transition after a draft has been verified.
    ///
    /// Terminal states are absorbing. `Enhanced` is returned as soon as the last
    /// attempt is rejected; the caller runs the enhancer on that draft.
    pub fn after_verification(self, accepted: bool, max_attempts: u32) -> GenerationState {
        match self {
            GenerationState::Attempt(_) if accepted => GenerationState::Accepted,
            GenerationState::Attempt(n) if n < max_attempts => GenerationState::Attempt(n + 1),
            GenerationState::Attempt(_) => GenerationState::Enhanced,
            terminal => terminal,
        }
    }
}

/// Final result of one generation session
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub state: GenerationState,
    /// Text to show the user; empty when `Failed`
    pub text: String,
    /// Drafts received from the service
    pub attempts: u32,
    /// Verdict of the last verified draft, if any was verified
    pub verification: Option<VerificationResult>,
}

impl GenerationOutcome {
    fn failed() -> Self {
        Self {
            state: GenerationState::Failed,
            text: String::new(),
            attempts: 0,
            verification: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == GenerationState::Failed
    }
}

/// Bounded generate-verify-regenerate loop over a completion service
pub struct RegenerationLoop<'a> {
    service: &'a dyn CompletionService,
    max_attempts: u32,
}

impl<'a> RegenerationLoop<'a> {
    pub fn new(service: &'a dyn CompletionService) -> Self {
        Self {
            service,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// At least one attempt is always made
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Run the loop for one user turn over the conversation `messages`
    pub async fn run(&self, messages: &[ChatMessage], profile: &UserProfile) -> GenerationOutcome {
        let user_id = profile.user_id;
        let mut attempt = 1;
        let mut request: Vec<ChatMessage> = messages.to_vec();
        let mut last_draft: Option<(String, VerificationResult)> = None;

        loop {
            let completion = self.service.complete(SYSTEM_PROMPT, &request).await.and_then(|completion| {
                if completion.text.trim().is_empty() {
                    Err(LlmError::ParseError("empty completion".to_string()))
                } else {
                    Ok(completion)
                }
            });

            let draft = match completion {
                Ok(completion) => completion.text,
                Err(e) => {
                    warn!(user_id, attempt, error = %e, "Generation call failed");
                    return match last_draft {
                        Some((text, result)) => self.enhance(text, result, attempt - 1).await,
                        None => GenerationOutcome::failed(),
                    };
                }
            };

            if attempt == 1 && !looks_like_recipe(&draft) {
                info!(user_id, "Reply is conversational, skipping verification");
                return GenerationOutcome {
                    state: GenerationState::Accepted,
                    text: draft,
                    attempts: 1,
                    verification: None,
                };
            }

            let result = verify_recipe(&draft, profile);
            let state = GenerationState::Attempt(attempt).after_verification(result.is_accepted(), self.max_attempts);

            match state {
                GenerationState::Accepted => {
                    info!(user_id, attempts = attempt, surprise_score = result.surprise_score, "Recipe accepted");
                    return GenerationOutcome {
                        state,
                        text: draft,
                        attempts: attempt,
                        verification: Some(result),
                    };
                }
                GenerationState::Attempt(next) => {
                    let hints = regeneration_hints(&result, attempt);
                    info!(user_id, attempt = next, %hints, "Regenerating recipe");
                    request = messages.to_vec();
                    request.push(ChatMessage::system(regeneration_note(&hints)));
                    last_draft = Some((draft, result));
                    attempt = next;
                }
                _ => return self.enhance(draft, result, attempt).await,
            }
        }
    }

    async fn enhance(&self, draft: String, result: VerificationResult, attempts: u32) -> GenerationOutcome {
        info!(attempts, surprise_score = result.surprise_score, has_humor = result.has_humor, "Attempts exhausted, enhancing");
        let text = enhance_recipe(self.service, &draft, &result).await;
        GenerationOutcome {
            state: GenerationState::Enhanced,
            text,
            attempts,
            verification: Some(result),
        }
    }
}
