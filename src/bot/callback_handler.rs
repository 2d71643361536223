//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error};

use crate::dialogue::{ChatDialogue, ChatSessionState};
use crate::localization::t_lang;

use super::dialogue_manager::cook_with_ingredients;
use super::message_handler::AppState;
use super::ui_builder::{create_ingredient_review_keyboard, format_review_message};

/// Handle callback queries from the ingredient review keyboard
pub async fn callback_handler(
    bot: Bot,
    q: teloxide::types::CallbackQuery,
    state: Arc<AppState>,
    dialogue: ChatDialogue,
) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    // Answer right away; cooking a recipe outlasts Telegram's callback timeout
    bot.answer_callback_query(q.id.clone()).await?;

    let dialogue_state = dialogue.get().await?;
    debug!(user_id = %q.from.id, dialogue_state = ?dialogue_state, "Retrieved dialogue state");

    let Some(ChatSessionState::ReviewingIngredients {
        mut ingredients,
        language_code,
        message_id,
    }) = dialogue_state
    else {
        // Stale keyboard from a finished review
        return Ok(());
    };

    let (Some(data), Some(msg)) = (q.data.as_deref(), &q.message) else {
        return Ok(());
    };
    let chat_id = msg.chat().id;
    let language_code = language_code.as_deref();

    if let Some(index) = data.strip_prefix("delete_").and_then(|i| i.parse::<usize>().ok()) {
        if index >= ingredients.len() {
            // Invalid index - ignore silently
            return Ok(());
        }

        let removed = ingredients.remove(index);
        debug!(user_id = %q.from.id, removed = %removed, remaining = ingredients.len(), "Ingredient removed from review");

        let review_message = if ingredients.is_empty() {
            format!(
                "🔍 {}\n\n{}",
                t_lang("review-title", language_code),
                t_lang("review-empty", language_code)
            )
        } else {
            format_review_message(&ingredients, language_code)
        };

        if let Err(e) = bot
            .edit_message_text(chat_id, msg.id(), review_message)
            .reply_markup(create_ingredient_review_keyboard(&ingredients, language_code))
            .await
        {
            error!(user_id = %q.from.id, error = %e, "Failed to edit message after ingredient deletion");
        }

        dialogue
            .update(ChatSessionState::ReviewingIngredients {
                ingredients,
                language_code: language_code.map(|s| s.to_string()),
                message_id,
            })
            .await?;
    } else if data == "cook" {
        if let Err(e) = bot.edit_message_reply_markup(chat_id, msg.id()).await {
            debug!(user_id = %q.from.id, error = %e, "Failed to remove review keyboard");
        }
        cook_with_ingredients(&bot, chat_id, &dialogue, &state, ingredients, language_code).await?;
    } else if data == "cancel_review" {
        if let Err(e) = bot.edit_message_reply_markup(chat_id, msg.id()).await {
            debug!(user_id = %q.from.id, error = %e, "Failed to remove review keyboard");
        }
        bot.send_message(chat_id, t_lang("review-cancelled", language_code)).await?;
        dialogue.exit().await?;
    }

    Ok(())
}
