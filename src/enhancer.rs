//! # Recipe Enhancement
//!
//! Last-resort rewrite of a recipe that kept failing verification. Never
//! fails: any service error hands back the recipe unchanged.

use std::time::Instant;
use tracing::{error, info};

use crate::llm::{estimate_cost_usd, ChatMessage, CompletionService};
use crate::prompts::{enhancement_request, ENHANCEMENT_SYSTEM_PROMPT};
use crate::verification::VerificationResult;

/// Ask the service to make `recipe_text` more surprising and funnier.
///
/// Returns the input untouched when the verdict needs no enhancement or the
/// call fails.
pub async fn enhance_recipe(service: &dyn CompletionService, recipe_text: &str, result: &VerificationResult) -> String {
    if !result.needs_enhancement {
        return recipe_text.to_string();
    }

    let start = Instant::now();
    let messages = [ChatMessage::user(enhancement_request(recipe_text, result))];

    match service.complete(ENHANCEMENT_SYSTEM_PROMPT, &messages).await {
        Ok(completion) if !completion.text.trim().is_empty() => {
            info!(
                surprise_score = result.surprise_score,
                has_humor = result.has_humor,
                tokens = completion.total_tokens,
                cost_usd = estimate_cost_usd(completion.total_tokens),
                duration_ms = start.elapsed().as_millis() as u64,
                "ENHANCE_SUCCESS"
            );
            completion.text
        }
        Ok(_) => {
            error!("ENHANCE_ERROR: empty completion");
            recipe_text.to_string()
        }
        Err(e) => {
            error!(error = %e, "ENHANCE_ERROR");
            recipe_text.to_string()
        }
    }
}
