//! Preference blocks appended by the model to its replies.
//!
//! A reply may end with a fenced ```json object describing what the model
//! learned about the user. The object is stored and the block is cut from the
//! text the user sees.

use serde_json::{Map, Value};
use thiserror::Error;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

#[derive(Debug, Error, PartialEq)]
pub enum PreferenceError {
    #[error("Preference block is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Preference block is not a JSON object")]
    NotAnObject,
}

/// A reply split into its visible text and extracted preferences
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub text: String,
    pub preferences: Option<Map<String, Value>>,
}

/// Separate the preference block from a model reply.
///
/// Replies without a block come back unchanged with no preferences. A block
/// that does not parse to a JSON object is an error; the caller keeps the
/// full reply in that case.
pub fn split_preferences_block(reply: &str) -> Result<ParsedReply, PreferenceError> {
    let Some(start) = reply.find(JSON_FENCE) else {
        return Ok(ParsedReply {
            text: reply.to_string(),
            preferences: None,
        });
    };

    let after_fence = &reply[start + JSON_FENCE.len()..];
    let body = match after_fence.find(FENCE) {
        Some(end) => &after_fence[..end],
        None => after_fence,
    };

    let value: Value = serde_json::from_str(body.trim()).map_err(|e| PreferenceError::InvalidJson(e.to_string()))?;
    let Value::Object(preferences) = value else {
        return Err(PreferenceError::NotAnObject);
    };

    Ok(ParsedReply {
        text: reply[..start].trim().to_string(),
        preferences: Some(preferences),
    })
}

/// Readable label for a preference key ("cooking_level" becomes "Cooking level")
pub fn preference_label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Readable form of a preference value; arrays are comma-joined
pub fn preference_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(preference_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
