use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::dispatching::dialogue::{self, InMemStorage};
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use funny_recipes::bot::{self, AppState, ConversationSettings};
use funny_recipes::config::{load_env, BotConfig, LogFormat};
use funny_recipes::db;
use funny_recipes::dialogue::ChatSessionState;
use funny_recipes::llm::{CompletionService, OpenRouterClient};
use funny_recipes::localization::init_localization_from;
use funny_recipes::transcription::WhisperClient;

fn init_tracing(format: LogFormat) {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    load_env();

    let config = BotConfig::from_env()?;
    init_tracing(config.log_format);

    info!("Starting Funny Recipes Telegram Bot");

    init_localization_from(&config.locales_dir).context("Failed to load localization bundles")?;

    info!(database_url = %config.database_url, "Initializing database");
    let pool = db::connect(&config.database_url).await?;
    db::init_database_schema(&pool).await?;

    let llm = OpenRouterClient::new(config.llm.clone()).context("Failed to build completion client")?;
    let whisper = WhisperClient::new(config.transcription.clone()).context("Failed to build transcription client")?;
    info!(model = llm.model_name(), "Completion client ready");

    let state = Arc::new(AppState {
        pool,
        llm,
        whisper,
        settings: ConversationSettings::from(&config),
    });

    let bot = Bot::new(config.telegram_token.clone());

    info!("Bot initialized, starting dispatcher");

    let handler = dialogue::enter::<Update, InMemStorage<ChatSessionState>, ChatSessionState, _>()
        .branch(Update::filter_message().endpoint(bot::message_handler))
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<ChatSessionState>::new(), state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
