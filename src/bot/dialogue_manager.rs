//! Dialogue Manager module for handling dialogue state transitions

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{debug, info};

use crate::dialogue::{merge_ingredients, parse_review_input, ChatDialogue, ChatSessionState, ReviewInput};
use crate::localization::{t_args_lang, t_lang};
use crate::prompts::photo_ingredients_message;

use super::message_handler::{run_conversation_turn, AppState};
use super::ui_builder::{create_ingredient_review_keyboard, format_review_message};

/// Handle a text message sent while ingredients are under review
#[allow(clippy::too_many_arguments)]
pub async fn handle_review_input(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &ChatDialogue,
    state: &AppState,
    text: &str,
    mut ingredients: Vec<String>,
    language_code: Option<&str>,
    message_id: Option<i32>,
) -> Result<()> {
    match parse_review_input(text) {
        Ok(ReviewInput::Cook) => {
            clear_review_keyboard(bot, chat_id, message_id).await;
            cook_with_ingredients(bot, chat_id, dialogue, state, ingredients, language_code).await
        }
        Ok(ReviewInput::Cancel) => {
            clear_review_keyboard(bot, chat_id, message_id).await;
            bot.send_message(chat_id, t_lang("review-cancelled", language_code)).await?;
            dialogue.exit().await?;
            Ok(())
        }
        Ok(ReviewInput::Add(additions)) => {
            let added = merge_ingredients(&mut ingredients, additions);
            debug!(user_id = %chat_id, added, total = ingredients.len(), "Ingredients added during review");

            // The old keyboard is out of date; move the review below the user's message
            clear_review_keyboard(bot, chat_id, message_id).await;

            let count = added.to_string();
            let review_message = format!(
                "{}\n\n{}",
                t_args_lang("review-added", &[("count", &count)], language_code),
                format_review_message(&ingredients, language_code)
            );
            let sent_message = bot
                .send_message(chat_id, review_message)
                .reply_markup(create_ingredient_review_keyboard(&ingredients, language_code))
                .await?;

            dialogue
                .update(ChatSessionState::ReviewingIngredients {
                    ingredients,
                    language_code: language_code.map(|s| s.to_string()),
                    message_id: Some(sent_message.id.0),
                })
                .await?;
            Ok(())
        }
        Err("too_long") => {
            bot.send_message(chat_id, t_lang("review-invalid-too-long", language_code))
                .await?;
            // Keep dialogue active, user can try again
            Ok(())
        }
        Err(_) => {
            bot.send_message(chat_id, t_lang("review-invalid-empty", language_code))
                .await?;
            Ok(())
        }
    }
}

/// Close the review and ask for a recipe built from the reviewed ingredients.
///
/// An empty list keeps the review open so the user can still add items.
pub async fn cook_with_ingredients(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &ChatDialogue,
    state: &AppState,
    ingredients: Vec<String>,
    language_code: Option<&str>,
) -> Result<()> {
    if ingredients.is_empty() {
        bot.send_message(chat_id, t_lang("review-empty", language_code)).await?;
        return Ok(());
    }

    dialogue.exit().await?;

    info!(user_id = %chat_id, ingredients_count = ingredients.len(), "Cooking with reviewed ingredients");

    let listed = ingredients.join(", ");
    bot.send_message(
        chat_id,
        t_args_lang("cooking-with", &[("ingredients", &listed)], language_code),
    )
    .await?;

    run_conversation_turn(bot, chat_id, state, &photo_ingredients_message(&ingredients), language_code).await
}

async fn clear_review_keyboard(bot: &Bot, chat_id: ChatId, message_id: Option<i32>) {
    if let Some(id) = message_id {
        if let Err(e) = bot.edit_message_reply_markup(chat_id, MessageId(id)).await {
            debug!(user_id = %chat_id, error = %e, "Failed to remove review keyboard");
        }
    }
}
