//! # Conversation Pipeline Tests
//!
//! Full user turns against an in-memory database and a scripted model.

use anyhow::Result;
use funny_recipes::bot::{handle_user_turn, ConversationSettings, TurnOutcome};
use funny_recipes::db;
use funny_recipes::llm::{ChatRole, ScriptedService};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn setup_test_db() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    db::init_database_schema(&pool).await?;
    Ok(pool)
}

#[tokio::test]
async fn test_reply_is_stored_and_preferences_learned() -> Result<()> {
    let pool = setup_test_db().await?;
    let service = ScriptedService::new()
        .reply("Bonjour! What's in your fridge?\n\n```json\n{\"location\": \"Italy\", \"diet\": [\"vegetarian\"]}\n```");

    let outcome = handle_user_turn(&pool, &service, &ConversationSettings::default(), 1, "hi there", "en").await?;

    assert_eq!(outcome, TurnOutcome::Reply("Bonjour! What's in your fridge?".to_string()));

    let profile = db::get_user_profile(&pool, 1).await?.expect("profile created");
    assert_eq!(profile.preferences["location"], json!("Italy"));
    assert_eq!(profile.preferences["diet"], json!(["vegetarian"]));
    assert_eq!(profile.interaction_count, 1);

    let history = db::get_conversation_history(&pool, 1, 30).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, "user");
    assert_eq!(history[0].content, "hi there");
    assert_eq!(history[1].role, "assistant");
    assert_eq!(history[1].content, "Bonjour! What's in your fridge?");
    Ok(())
}

#[tokio::test]
async fn test_stored_preferences_reach_the_model() -> Result<()> {
    let pool = setup_test_db().await?;
    db::create_user_profile(&pool, 2).await?;
    let stored = json!({"location": "Italy"});
    if let serde_json::Value::Object(map) = stored {
        db::update_user_preferences(&pool, 2, &map).await?;
    }

    let service = ScriptedService::new().reply("Tell me more!");
    handle_user_turn(&pool, &service, &ConversationSettings::default(), 2, "tomatoes, pasta", "fr").await?;

    let calls = service.calls();
    assert_eq!(calls.len(), 1);
    let messages = &calls[0].messages;

    assert_eq!(messages[0].role, ChatRole::System);
    assert!(messages[0].content.contains("\"location\":\"Italy\""));
    assert!(messages[1].content.contains("italy"));
    assert!(messages[2].content.contains("French"));

    let last = messages.last().expect("user turn present");
    assert_eq!(last.role, ChatRole::User);
    assert_eq!(last.content, "tomatoes, pasta");
    Ok(())
}

#[tokio::test]
async fn test_history_window_is_bounded() -> Result<()> {
    let pool = setup_test_db().await?;
    for i in 0..10 {
        db::add_message_to_history(&pool, 3, "user", &format!("old {}", i)).await?;
    }

    let settings = ConversationSettings {
        max_context_messages: 4,
        ..ConversationSettings::default()
    };
    let service = ScriptedService::new().reply("ok");
    handle_user_turn(&pool, &service, &settings, 3, "newest", "en").await?;

    let messages = &service.calls()[0].messages;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3].content, "newest");
    Ok(())
}

#[tokio::test]
async fn test_interaction_limit_resets_conversation() -> Result<()> {
    let pool = setup_test_db().await?;
    let settings = ConversationSettings {
        interaction_limit: 3,
        ..ConversationSettings::default()
    };
    let service = ScriptedService::new().reply("one").reply("two").reply("never sent");

    assert_eq!(
        handle_user_turn(&pool, &service, &settings, 4, "first", "en").await?,
        TurnOutcome::Reply("one".into())
    );
    assert_eq!(
        handle_user_turn(&pool, &service, &settings, 4, "second", "en").await?,
        TurnOutcome::Reply("two".into())
    );
    assert_eq!(
        handle_user_turn(&pool, &service, &settings, 4, "third", "en").await?,
        TurnOutcome::LimitReached
    );

    assert_eq!(service.call_count(), 2);
    assert!(db::get_conversation_history(&pool, 4, 30).await?.is_empty());
    let profile = db::get_user_profile(&pool, 4).await?.expect("profile exists");
    assert_eq!(profile.interaction_count, 0);
    Ok(())
}

#[tokio::test]
async fn test_failed_generation_keeps_user_message_only() -> Result<()> {
    let pool = setup_test_db().await?;
    let service = ScriptedService::new().fail("service unavailable");

    let outcome = handle_user_turn(&pool, &service, &ConversationSettings::default(), 5, "eggs", "en").await?;

    assert_eq!(outcome, TurnOutcome::Failed);
    let history = db::get_conversation_history(&pool, 5, 30).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "eggs");
    Ok(())
}

#[tokio::test]
async fn test_blank_reply_is_not_sent() -> Result<()> {
    let pool = setup_test_db().await?;
    let service = ScriptedService::new().reply("");

    let outcome = handle_user_turn(&pool, &service, &ConversationSettings::default(), 7, "eggs", "en").await?;

    assert_eq!(outcome, TurnOutcome::Failed);
    let history = db::get_conversation_history(&pool, 7, 30).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, "user");
    Ok(())
}

#[tokio::test]
async fn test_invalid_preference_block_is_sent_verbatim() -> Result<()> {
    let pool = setup_test_db().await?;
    let reply = "Sounds tasty!\n```json\n{not json}\n```";
    let service = ScriptedService::new().reply(reply);

    let outcome = handle_user_turn(&pool, &service, &ConversationSettings::default(), 6, "hello", "en").await?;

    assert_eq!(outcome, TurnOutcome::Reply(reply.to_string()));
    let profile = db::get_user_profile(&pool, 6).await?.expect("profile exists");
    assert!(profile.preferences.is_empty());
    Ok(())
}
