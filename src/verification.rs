//! # Recipe Verification
//!
//! Judges a generated recipe for surprise and humor, and turns a failed
//! verdict into guidance for the next generation attempt.

use serde::Serialize;
use tracing::info;

use crate::db::UserProfile;
use crate::recipe_parser::{extract_humor, extract_ingredients};
use crate::surprise::{calculate_surprise_score, has_sufficient_humor, SURPRISE_THRESHOLD};

pub const SURPRISE_SUGGESTION: &str =
    "Increase surprise factor by adding more unexpected ingredient combinations";
pub const HUMOR_SUGGESTION: &str = "Add more humor and jokes, especially in the variations section";

/// Returned when a recipe passed both checks but hints were still requested
pub const FALLBACK_HINT: &str = "Create maximum surprise with unexpected combinations";

const SURPRISE_HINTS: &[&str] = &[
    "Focus on more unexpected ingredient combinations",
    "Mix ingredients from different culinary traditions",
    "Combine sweet and savory elements in surprising ways",
];

const AGGRESSIVE_SURPRISE_HINTS: &[&str] = &[
    "Use ingredients that would never normally go together",
    "Create fusion between completely different cuisines",
];

const HUMOR_HINTS: &[&str] = &[
    "Include at least one clear joke or humorous observation",
    "Add funny cultural commentary in the variations section",
    "Use playful language and cultural references",
];

const SPECIFIC_HUMOR_HINTS: &[&str] = &[
    "Add witty observations about cultural cooking traditions",
    "Include humorous historical anecdotes about the ingredients",
];

/// Separator between hint clauses
pub const HINT_SEPARATOR: &str = " | ";

/// Outcome of verifying one recipe draft
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub original_recipe: String,
    pub ingredients: Vec<String>,
    pub humor_text: String,
    /// In `[0.0, 2.0]`
    pub surprise_score: f64,
    pub has_humor: bool,
    pub needs_enhancement: bool,
    pub enhancement_suggestions: Vec<String>,
}

impl VerificationResult {
    /// Assemble a result from its measured parts; derives the verdict and suggestions.
    pub fn from_parts(
        original_recipe: String,
        ingredients: Vec<String>,
        humor_text: String,
        surprise_score: f64,
        has_humor: bool,
    ) -> Self {
        let lacks_surprise = surprise_score < SURPRISE_THRESHOLD;
        let needs_enhancement = lacks_surprise || !has_humor;

        let mut enhancement_suggestions = Vec::new();
        if lacks_surprise {
            enhancement_suggestions.push(SURPRISE_SUGGESTION.to_string());
        }
        if !has_humor {
            enhancement_suggestions.push(HUMOR_SUGGESTION.to_string());
        }

        Self {
            original_recipe,
            ingredients,
            humor_text,
            surprise_score,
            has_humor,
            needs_enhancement,
            enhancement_suggestions,
        }
    }

    pub fn is_accepted(&self) -> bool {
        !self.needs_enhancement
    }

    pub fn lacks_surprise(&self) -> bool {
        self.surprise_score < SURPRISE_THRESHOLD
    }
}

/// Verify a recipe draft for surprise and humor
pub fn verify_recipe(recipe_text: &str, profile: &UserProfile) -> VerificationResult {
    let ingredients = extract_ingredients(recipe_text);
    let humor_text = extract_humor(recipe_text);
    let surprise_score = calculate_surprise_score(&ingredients, profile);
    let has_humor = has_sufficient_humor(&humor_text);

    let result = VerificationResult::from_parts(
        recipe_text.to_string(),
        ingredients,
        humor_text,
        surprise_score,
        has_humor,
    );

    info!(
        user_id = profile.user_id,
        ingredients = result.ingredients.len(),
        surprise_score = result.surprise_score,
        has_humor = result.has_humor,
        accepted = result.is_accepted(),
        "VERIFY"
    );

    result
}

/// Hint clauses for the next attempt, escalating from attempt 2 onwards
pub fn regeneration_hint_clauses(result: &VerificationResult, attempt_number: u32) -> Vec<&'static str> {
    let mut hints = Vec::new();

    if result.lacks_surprise() {
        hints.extend_from_slice(SURPRISE_HINTS);
        if attempt_number >= 2 {
            hints.extend_from_slice(AGGRESSIVE_SURPRISE_HINTS);
        }
    }

    if !result.has_humor {
        hints.extend_from_slice(HUMOR_HINTS);
        if attempt_number >= 2 {
            hints.extend_from_slice(SPECIFIC_HUMOR_HINTS);
        }
    }

    hints
}

/// Guidance string appended to the next generation request
pub fn regeneration_hints(result: &VerificationResult, attempt_number: u32) -> String {
    let hints = regeneration_hint_clauses(result, attempt_number);
    if hints.is_empty() {
        FALLBACK_HINT.to_string()
    } else {
        hints.join(HINT_SEPARATOR)
    }
}
