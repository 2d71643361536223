//! Conversation pipeline shared by text, voice and photo flows.
//!
//! One user turn: profile bookkeeping, interaction limit, history, context
//! notes, the regeneration loop, preference extraction and history update.
//! Nothing here touches Telegram, so the whole turn runs against an in-memory
//! database and a scripted completion service in tests.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::config::{
    BotConfig, DEFAULT_INTERACTION_LIMIT, DEFAULT_MAX_CONTEXT_MESSAGES, DEFAULT_MAX_GENERATION_ATTEMPTS,
};
use crate::db::{self, HistoryMessage, UserProfile};
use crate::generation::RegenerationLoop;
use crate::ingredient_intelligence::{
    cultural_context, normalize_location, select_surprise_ingredients, DEFAULT_SURPRISE_COUNT,
};
use crate::llm::{ChatMessage, ChatRole, CompletionService};
use crate::localization::{language_name, DEFAULT_LANGUAGE};
use crate::preferences::split_preferences_block;
use crate::prompts::{language_note, local_ingredients_note, preferences_note};

/// Limits applied to every conversation
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSettings {
    pub max_context_messages: i64,
    pub interaction_limit: i64,
    pub max_generation_attempts: u32,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            max_context_messages: DEFAULT_MAX_CONTEXT_MESSAGES,
            interaction_limit: DEFAULT_INTERACTION_LIMIT,
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
        }
    }
}

impl From<&BotConfig> for ConversationSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            max_context_messages: config.max_context_messages,
            interaction_limit: config.interaction_limit,
            max_generation_attempts: config.max_generation_attempts,
        }
    }
}

/// Result of one user turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Text to send back (preference block already removed)
    Reply(String),
    /// Interaction limit hit; count and history were reset
    LimitReached,
    /// No reply could be generated
    Failed,
}

/// Ingredient-like fragments of a user message, used to avoid suggesting what they already have
pub fn mentioned_ingredients(user_text: &str) -> Vec<String> {
    user_text
        .split([',', '\n', ';'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// System notes placed ahead of the history
pub fn context_notes(profile: &UserProfile, user_text: &str, language: &str) -> Vec<ChatMessage> {
    let mut notes = Vec::new();

    if !profile.preferences.is_empty() {
        let preferences = serde_json::Value::Object(profile.preferences.clone()).to_string();
        notes.push(ChatMessage::system(preferences_note(&preferences)));
    }

    if let Some(location) = profile.location().and_then(normalize_location) {
        let surprises = select_surprise_ingredients(location, &mentioned_ingredients(user_text), DEFAULT_SURPRISE_COUNT);
        if !surprises.is_empty() {
            debug!(user_id = profile.user_id, location, ?surprises, "Local surprise ingredients selected");
            notes.push(ChatMessage::system(local_ingredients_note(
                location,
                &surprises,
                cultural_context(location),
            )));
        }
    }

    if language != DEFAULT_LANGUAGE {
        notes.push(ChatMessage::system(language_note(language_name(language))));
    }

    notes
}

/// Context notes followed by the stored history
pub fn build_messages(notes: Vec<ChatMessage>, history: &[HistoryMessage]) -> Vec<ChatMessage> {
    let mut messages = notes;
    messages.extend(
        history
            .iter()
            .map(|message| ChatMessage::new(ChatRole::parse(&message.role), message.content.clone())),
    );
    messages
}

/// Store any preference block found in `reply` and return the text for the user
pub async fn apply_preferences(pool: &SqlitePool, user_id: i64, reply: &str) -> Result<String> {
    match split_preferences_block(reply) {
        Ok(parsed) => {
            if let Some(preferences) = parsed.preferences {
                db::update_user_preferences(pool, user_id, &preferences).await?;
                info!(user_id, keys = preferences.len(), "Preferences learned from reply");
            }
            Ok(parsed.text)
        }
        Err(e) => {
            warn!(user_id, error = %e, "Could not parse preferences from reply");
            Ok(reply.to_string())
        }
    }
}

/// Run one user turn end to end
pub async fn handle_user_turn(
    pool: &SqlitePool,
    service: &dyn CompletionService,
    settings: &ConversationSettings,
    user_id: i64,
    user_text: &str,
    language: &str,
) -> Result<TurnOutcome> {
    let profile = db::get_or_create_user_profile(pool, user_id).await?;

    let interaction_count = db::increment_interaction_count(pool, user_id).await?;
    if interaction_count >= settings.interaction_limit {
        info!(user_id, interaction_count, "Interaction limit reached, retuning conversation");
        db::reset_interaction_count(pool, user_id).await?;
        db::delete_conversation_history(pool, user_id).await?;
        return Ok(TurnOutcome::LimitReached);
    }

    db::add_message_to_history(pool, user_id, ChatRole::User.as_str(), user_text).await?;
    let history = db::get_conversation_history(pool, user_id, settings.max_context_messages).await?;
    let messages = build_messages(context_notes(&profile, user_text, language), &history);

    let outcome = RegenerationLoop::new(service)
        .with_max_attempts(settings.max_generation_attempts)
        .run(&messages, &profile)
        .await;

    if outcome.is_failed() {
        return Ok(TurnOutcome::Failed);
    }

    info!(user_id, state = ?outcome.state, attempts = outcome.attempts, "Reply generated");

    let reply = apply_preferences(pool, user_id, &outcome.text).await?;
    db::add_message_to_history(pool, user_id, ChatRole::Assistant.as_str(), &reply).await?;

    Ok(TurnOutcome::Reply(reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_mentioned_ingredients() {
        assert_eq!(
            mentioned_ingredients("eggs, feta cheese\nlemon;"),
            vec!["eggs", "feta cheese", "lemon"]
        );
        assert!(mentioned_ingredients("  ").is_empty());
    }

    #[test]
    fn test_context_notes_for_new_user() {
        let profile = UserProfile::new(1);
        assert!(context_notes(&profile, "hi", "en").is_empty());
    }

    #[test]
    fn test_context_notes_with_preferences_location_and_language() {
        let mut profile = UserProfile::new(1);
        profile.preferences.insert("location".into(), Value::String("Athens, Greece".into()));

        let notes = context_notes(&profile, "feta", "fr");
        assert_eq!(notes.len(), 3);
        assert!(notes.iter().all(|note| note.role == ChatRole::System));
        assert!(notes[0].content.contains("Athens, Greece"));
        assert!(notes[1].content.contains("greece"));
        assert!(!notes[1].content.contains("feta"));
        assert!(notes[2].content.contains("French"));
    }

    #[test]
    fn test_build_messages_keeps_order() {
        let history = vec![
            HistoryMessage { role: "user".into(), content: "hi".into() },
            HistoryMessage { role: "assistant".into(), content: "hello".into() },
        ];
        let messages = build_messages(vec![ChatMessage::system("note")], &history);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[1], ChatMessage::user("hi"));
        assert_eq!(messages[2], ChatMessage::assistant("hello"));
    }
}
