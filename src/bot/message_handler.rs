//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, FileId};
use tracing::{debug, error, info, warn};

use crate::db::{self, JourneyStage};
use crate::dialogue::{ChatDialogue, ChatSessionState};
use crate::llm::{ChatRole, OpenRouterClient};
use crate::localization::{detect_language, t_args_lang, t_lang};
use crate::preferences::preference_label;
use crate::transcription::WhisperClient;
use crate::vision::identify_ingredients_from_photo;

use super::conversation::{handle_user_turn, ConversationSettings, TurnOutcome};
use super::dialogue_manager::handle_review_input;
use super::ui_builder::{
    create_ingredient_review_keyboard, format_preferences, format_review_message, split_message, MESSAGE_CHUNK_UNITS,
};

/// Shared services handed to every handler
#[derive(Debug)]
pub struct AppState {
    pub pool: SqlitePool,
    pub llm: OpenRouterClient,
    pub whisper: WhisperClient,
    pub settings: ConversationSettings,
}

fn message_language(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_ref())
        .map(|s| s.as_str())
}

/// Download a Telegram file into memory
pub async fn download_file(bot: &Bot, file_id: FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let url = format!("https://api.telegram.org/file/bot{}/{}", bot.token(), file.path);

    let response = reqwest::get(&url).await?.error_for_status()?;
    let bytes = response.bytes().await?;

    Ok(bytes.to_vec())
}

/// Send text in as many messages as Telegram's size limit requires
pub async fn send_long_message(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    for chunk in split_message(text, MESSAGE_CHUNK_UNITS) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

/// Run the conversation pipeline for one user turn and deliver the outcome
pub async fn run_conversation_turn(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    user_text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    if let Err(e) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
        debug!(user_id = %chat_id, error = %e, "Failed to send typing action");
    }

    let outcome = handle_user_turn(
        &state.pool,
        &state.llm,
        &state.settings,
        chat_id.0,
        user_text,
        detect_language(language_code),
    )
    .await;

    match outcome {
        Ok(TurnOutcome::Reply(reply)) => {
            send_long_message(bot, chat_id, &reply).await?;
        }
        Ok(TurnOutcome::LimitReached) => {
            let retune_message = t_lang("retune-message", language_code);
            db::add_message_to_history(&state.pool, chat_id.0, ChatRole::Assistant.as_str(), &retune_message).await?;
            bot.send_message(chat_id, retune_message).await?;
        }
        Ok(TurnOutcome::Failed) => {
            warn!(user_id = %chat_id, "No reply could be generated");
            bot.send_message(chat_id, t_lang("error-generation", language_code)).await?;
        }
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Conversation turn failed");
            bot.send_message(chat_id, t_lang("error-generation", language_code)).await?;
        }
    }

    Ok(())
}

async fn handle_start_command(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    dialogue: &ChatDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = msg.chat.id.0;
    let profile = db::get_or_create_user_profile(&state.pool, user_id).await?;

    // A fresh start drops the previous conversation and any pending review
    db::delete_conversation_history(&state.pool, user_id).await?;
    dialogue.exit().await?;

    let welcome_message = if profile.journey_stage == JourneyStage::NewUser {
        db::update_journey_stage(&state.pool, user_id, profile.journey_stage.next()).await?;
        t_lang("welcome-new", language_code)
    } else if profile.preferences.is_empty() {
        t_lang("welcome-back", language_code)
    } else {
        let remembered = profile
            .preferences
            .keys()
            .map(|key| preference_label(key).to_lowercase())
            .collect::<Vec<_>>()
            .join(", ");
        t_args_lang("welcome-back-preferences", &[("preferences", &remembered)], language_code)
    };

    info!(user_id, stage = profile.journey_stage.as_str(), "User started a conversation");

    db::add_message_to_history(&state.pool, user_id, ChatRole::Assistant.as_str(), &welcome_message).await?;
    bot.send_message(msg.chat.id, welcome_message).await?;
    Ok(())
}

async fn handle_preferences_command(bot: &Bot, msg: &Message, state: &AppState, language_code: Option<&str>) -> Result<()> {
    let profile = db::get_user_profile(&state.pool, msg.chat.id.0).await?;

    let response = match profile {
        Some(profile) if !profile.preferences.is_empty() => format!(
            "📜 {}\n\n{}",
            t_lang("preferences-title", language_code),
            format_preferences(&profile.preferences)
        ),
        _ => t_lang("preferences-empty", language_code),
    };

    bot.send_message(msg.chat.id, response).await?;
    Ok(())
}

async fn handle_reset_command(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    dialogue: &ChatDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = msg.chat.id.0;

    let removed_messages = db::delete_conversation_history(&state.pool, user_id).await?;
    db::delete_user_profile(&state.pool, user_id).await?;
    db::create_user_profile(&state.pool, user_id).await?;
    dialogue.exit().await?;

    info!(user_id, removed_messages, "User profile reset");

    bot.send_message(msg.chat.id, t_lang("reset-done", language_code)).await?;
    Ok(())
}

fn help_message(language_code: Option<&str>) -> String {
    [
        "help-title",
        "help-description",
        "help-step1",
        "help-step2",
        "help-step3",
        "help-commands",
        "help-start",
        "help-preferences",
        "help-reset",
        "help-photo",
        "help-final",
    ]
    .iter()
    .map(|key| t_lang(key, language_code))
    .collect::<Vec<_>>()
    .join("\n\n")
}

async fn handle_text_message(bot: &Bot, msg: &Message, state: &AppState, dialogue: ChatDialogue) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

    let language_code = message_language(msg);

    // Strip a "@botname" suffix so commands work in groups
    let command = text
        .split_whitespace()
        .next()
        .filter(|word| word.starts_with('/'))
        .map(|word| word.split('@').next().unwrap_or(word));

    match command {
        Some("/start") => return handle_start_command(bot, msg, state, &dialogue, language_code).await,
        Some("/help") => {
            bot.send_message(msg.chat.id, help_message(language_code)).await?;
            return Ok(());
        }
        Some("/preferences") => return handle_preferences_command(bot, msg, state, language_code).await,
        Some("/reset") => return handle_reset_command(bot, msg, state, &dialogue, language_code).await,
        Some("/photo_help") => {
            bot.send_message(msg.chat.id, t_lang("photo-help", language_code)).await?;
            return Ok(());
        }
        _ => {}
    }

    if let Some(ChatSessionState::ReviewingIngredients {
        ingredients,
        language_code: dialogue_lang_code,
        message_id,
    }) = dialogue.get().await?
    {
        // Use dialogue language code if available, otherwise fall back to message language
        let effective_language_code = dialogue_lang_code.as_deref().or(language_code);

        return handle_review_input(
            bot,
            msg.chat.id,
            &dialogue,
            state,
            text,
            ingredients,
            effective_language_code,
            message_id,
        )
        .await;
    }

    run_conversation_turn(bot, msg.chat.id, state, text, language_code).await
}

async fn handle_voice_message(bot: &Bot, msg: &Message, state: &AppState) -> Result<()> {
    let Some(voice) = msg.voice() else {
        return Ok(());
    };

    let language_code = message_language(msg);
    debug!(user_id = %msg.chat.id, "Received voice message from user");

    let processing = bot.send_message(msg.chat.id, t_lang("processing-voice", language_code)).await?;

    let audio = match download_file(bot, voice.file.id.clone()).await {
        Ok(audio) => audio,
        Err(e) => {
            error!(user_id = %msg.chat.id, error = %e, "Failed to download voice message");
            bot.edit_message_text(msg.chat.id, processing.id, t_lang("error-download-failed", language_code))
                .await?;
            return Ok(());
        }
    };

    let transcript = match state.whisper.transcribe(audio).await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => {
            warn!(user_id = %msg.chat.id, "Transcription returned empty text");
            bot.edit_message_text(msg.chat.id, processing.id, t_lang("error-voice-empty", language_code))
                .await?;
            return Ok(());
        }
        Err(e) => {
            error!(user_id = %msg.chat.id, error = %e, "Voice transcription failed");
            bot.edit_message_text(msg.chat.id, processing.id, t_lang("error-voice", language_code))
                .await?;
            return Ok(());
        }
    };

    info!(user_id = %msg.chat.id, chars = transcript.len(), "Voice message transcribed");

    bot.edit_message_text(
        msg.chat.id,
        processing.id,
        t_args_lang("voice-heard", &[("text", &transcript)], language_code),
    )
    .await?;

    run_conversation_turn(bot, msg.chat.id, state, &transcript, language_code).await
}

/// Download an image, identify its ingredients and open the review keyboard
pub async fn download_and_review_image(
    bot: &Bot,
    file_id: FileId,
    chat_id: ChatId,
    state: &AppState,
    dialogue: &ChatDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    let processing = bot.send_message(chat_id, t_lang("processing-photo", language_code)).await?;

    let image_bytes = match download_file(bot, file_id).await {
        Ok(bytes) => {
            debug!(user_id = %chat_id, bytes = bytes.len(), "Image downloaded successfully");
            bytes
        }
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Failed to download image for user");
            bot.edit_message_text(chat_id, processing.id, t_lang("error-download-failed", language_code))
                .await?;
            return Ok(());
        }
    };

    let ingredients = match identify_ingredients_from_photo(&state.llm, &image_bytes).await {
        Ok(ingredients) => ingredients,
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Ingredient identification failed");
            bot.edit_message_text(chat_id, processing.id, t_lang("error-photo", language_code))
                .await?;
            return Ok(());
        }
    };

    if ingredients.is_empty() {
        warn!(user_id = %chat_id, "No ingredients identified in photo");
        bot.edit_message_text(chat_id, processing.id, t_lang("no-ingredients-found", language_code))
            .await?;
        return Ok(());
    }

    info!(user_id = %chat_id, ingredients_count = ingredients.len(), "Sending ingredients review interface");

    bot.edit_message_text(chat_id, processing.id, format_review_message(&ingredients, language_code))
        .reply_markup(create_ingredient_review_keyboard(&ingredients, language_code))
        .await?;

    dialogue
        .update(ChatSessionState::ReviewingIngredients {
            ingredients,
            language_code: language_code.map(|s| s.to_string()),
            message_id: Some(processing.id.0),
        })
        .await?;

    Ok(())
}

async fn handle_photo_message(bot: &Bot, msg: &Message, state: &AppState, dialogue: ChatDialogue) -> Result<()> {
    debug!(user_id = %msg.chat.id, "Received photo message from user");

    if let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) {
        download_and_review_image(
            bot,
            largest_photo.file.id.clone(),
            msg.chat.id,
            state,
            &dialogue,
            message_language(msg),
        )
        .await?;
    }
    Ok(())
}

async fn handle_document_message(bot: &Bot, msg: &Message, state: &AppState, dialogue: ChatDialogue) -> Result<()> {
    let Some(doc) = msg.document() else {
        return Ok(());
    };

    let is_image = doc
        .mime_type
        .as_ref()
        .is_some_and(|mime_type| mime_type.to_string().starts_with("image/"));

    if is_image {
        debug!(user_id = %msg.chat.id, "Received image document from user");
        download_and_review_image(bot, doc.file.id.clone(), msg.chat.id, state, &dialogue, message_language(msg)).await
    } else {
        handle_unsupported_message(bot, msg).await
    }
}

async fn handle_unsupported_message(bot: &Bot, msg: &Message) -> Result<()> {
    let language_code = message_language(msg);

    debug!(user_id = %msg.chat.id, "Received unsupported message type from user");

    let help_message = format!(
        "{}\n\n{}\n{}\n{}\n{}\n\n{}",
        t_lang("unsupported-title", language_code),
        t_lang("unsupported-description", language_code),
        t_lang("unsupported-feature1", language_code),
        t_lang("unsupported-feature2", language_code),
        t_lang("unsupported-feature3", language_code),
        t_lang("unsupported-final", language_code)
    );
    bot.send_message(msg.chat.id, help_message).await?;
    Ok(())
}

pub async fn message_handler(bot: Bot, msg: Message, state: Arc<AppState>, dialogue: ChatDialogue) -> Result<()> {
    if msg.text().is_some() {
        handle_text_message(&bot, &msg, &state, dialogue).await?;
    } else if msg.voice().is_some() {
        handle_voice_message(&bot, &msg, &state).await?;
    } else if msg.photo().is_some() {
        handle_photo_message(&bot, &msg, &state, dialogue).await?;
    } else if msg.document().is_some() {
        handle_document_message(&bot, &msg, &state, dialogue).await?;
    } else {
        handle_unsupported_message(&bot, &msg).await?;
    }

    Ok(())
}

