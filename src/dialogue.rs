//! Per-chat session state for the photo ingredient review flow.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Longest accepted free-text ingredient addition
pub const MAX_INGREDIENT_INPUT_LEN: usize = 255;

/// Represents the conversation state of one chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ChatSessionState {
    #[default]
    Idle,
    /// Ingredients recognized from a photo, awaiting the user's review
    ReviewingIngredients {
        ingredients: Vec<String>,
        language_code: Option<String>,
        message_id: Option<i32>,
    },
}

/// Session store keyed by chat id
pub type ChatDialogue = Dialogue<ChatSessionState, InMemStorage<ChatSessionState>>;

/// What a text message means while ingredients are under review
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewInput {
    Cook,
    Cancel,
    Add(Vec<String>),
}

/// Validates a free-text ingredient addition, splitting it on commas
pub fn validate_ingredient_input(text: &str) -> Result<Vec<String>, &'static str> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > MAX_INGREDIENT_INPUT_LEN {
        return Err("too_long");
    }

    let ingredients: Vec<String> = trimmed
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    if ingredients.is_empty() {
        return Err("empty");
    }

    Ok(ingredients)
}

/// Classify a text message sent during review
pub fn parse_review_input(text: &str) -> Result<ReviewInput, &'static str> {
    match text.trim().to_lowercase().as_str() {
        "cook" | "ok" | "yes" | "go" | "cuisiner" | "oui" => Ok(ReviewInput::Cook),
        "cancel" | "stop" | "annuler" => Ok(ReviewInput::Cancel),
        _ => validate_ingredient_input(text).map(ReviewInput::Add),
    }
}

/// Append new ingredients, skipping case-insensitive duplicates
pub fn merge_ingredients(existing: &mut Vec<String>, additions: Vec<String>) -> usize {
    let mut added = 0;
    for addition in additions {
        if !existing.iter().any(|item| item.eq_ignore_ascii_case(&addition)) {
            existing.push(addition);
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_input_validation() {
        assert_eq!(validate_ingredient_input(" eggs, milk ,"), Ok(vec!["eggs".to_string(), "milk".to_string()]));
        assert_eq!(validate_ingredient_input(""), Err("empty"));
        assert_eq!(validate_ingredient_input(" , , "), Err("empty"));
        assert_eq!(validate_ingredient_input(&"a".repeat(256)), Err("too_long"));
    }

    #[test]
    fn test_review_input() {
        assert_eq!(parse_review_input("OK"), Ok(ReviewInput::Cook));
        assert_eq!(parse_review_input(" cook "), Ok(ReviewInput::Cook));
        assert_eq!(parse_review_input("Stop"), Ok(ReviewInput::Cancel));
        assert_eq!(
            parse_review_input("basil"),
            Ok(ReviewInput::Add(vec!["basil".to_string()]))
        );
        assert_eq!(parse_review_input("   "), Err("empty"));
    }

    #[test]
    fn test_merge_ingredients() {
        let mut list = vec!["Eggs".to_string()];
        let added = merge_ingredients(&mut list, vec!["eggs".into(), "basil".into()]);
        assert_eq!(added, 1);
        assert_eq!(list, vec!["Eggs", "basil"]);
    }

    #[test]
    fn test_default_state() {
        assert_eq!(ChatSessionState::default(), ChatSessionState::Idle);
    }
}
