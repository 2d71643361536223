//! UI Builder module for creating keyboards and formatting messages

use serde_json::{Map, Value};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::localization::t_lang;
use crate::preferences::{preference_label, preference_value};

/// Telegram's hard limit on message length, in UTF-16 code units
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Chunk size used when splitting, in UTF-16 code units
pub const MESSAGE_CHUNK_UNITS: usize = 4000;

const BUTTON_LABEL_CHARS: usize = 20;

/// Format ingredients as a simple numbered list for review
pub fn format_ingredients_list(ingredients: &[String]) -> String {
    ingredients
        .iter()
        .enumerate()
        .map(|(i, ingredient)| format!("{}. {}", i + 1, ingredient))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Review message shown above the keyboard
pub fn format_review_message(ingredients: &[String], language_code: Option<&str>) -> String {
    format!(
        "🔍 {}\n\n{}\n\n{}",
        t_lang("review-title", language_code),
        format_ingredients_list(ingredients),
        t_lang("review-description", language_code)
    )
}

fn button_label(text: &str) -> String {
    if text.chars().count() > BUTTON_LABEL_CHARS {
        let truncated: String = text.chars().take(BUTTON_LABEL_CHARS - 3).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

/// Create inline keyboard for ingredient review
pub fn create_ingredient_review_keyboard(ingredients: &[String], language_code: Option<&str>) -> InlineKeyboardMarkup {
    let mut buttons: Vec<Vec<InlineKeyboardButton>> = ingredients
        .iter()
        .enumerate()
        .map(|(i, ingredient)| {
            vec![InlineKeyboardButton::callback(
                format!("🗑️ {}", button_label(ingredient)),
                format!("delete_{}", i),
            )]
        })
        .collect();

    buttons.push(vec![
        InlineKeyboardButton::callback(format!("👨‍🍳 {}", t_lang("review-cook", language_code)), "cook"),
        InlineKeyboardButton::callback(format!("❌ {}", t_lang("cancel", language_code)), "cancel_review"),
    ]);

    InlineKeyboardMarkup::new(buttons)
}

/// Render stored preferences, one "- Label: value" line per key
pub fn format_preferences(preferences: &Map<String, Value>) -> String {
    preferences
        .iter()
        .map(|(key, value)| format!("- {}: {}", preference_label(key), preference_value(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Byte index of the longest prefix of `text` that fits in `max_units` UTF-16 code units
fn utf16_prefix_end(text: &str, max_units: usize) -> usize {
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > max_units {
            return index;
        }
    }
    text.len()
}

/// Split text into chunks Telegram accepts, preferring paragraph then line breaks.
///
/// `max_units` counts UTF-16 code units, the way Telegram measures message length.
pub fn split_message(text: &str, max_units: usize) -> Vec<String> {
    // A surrogate pair needs two units
    let max_units = max_units.max(2);
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while rest.encode_utf16().count() > max_units {
        let window_end = utf16_prefix_end(rest, max_units);
        let window = &rest[..window_end];

        let cut = window
            .rfind("\n\n")
            .or_else(|| window.rfind('\n'))
            .or_else(|| window.rfind(' '))
            .filter(|&index| index > 0)
            .unwrap_or(window_end);

        chunks.push(rest[..cut].trim_end().to_string());
        rest = rest[cut..].trim_start();
    }

    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }

    chunks
}
