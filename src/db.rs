use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{info, warn};

/// Where a user stands in their relationship with the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStage {
    #[default]
    NewUser,
    Familiar,
    HealthFocused,
}

impl JourneyStage {
    pub fn as_str(self) -> &'static str {
        match self {
            JourneyStage::NewUser => "new_user",
            JourneyStage::Familiar => "familiar",
            JourneyStage::HealthFocused => "health_focused",
        }
    }

    /// Unrecognized stored values fall back to `NewUser`
    pub fn parse(value: &str) -> Self {
        match value {
            "familiar" => JourneyStage::Familiar,
            "health_focused" => JourneyStage::HealthFocused,
            _ => JourneyStage::NewUser,
        }
    }

    /// Stage reached after a fresh `/start`
    pub fn next(self) -> Self {
        match self {
            JourneyStage::NewUser => JourneyStage::Familiar,
            other => other,
        }
    }
}

/// Persisted per-user state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub journey_stage: JourneyStage,
    pub preferences: Map<String, Value>,
    pub interaction_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Blank profile for a user who has never talked to the bot
    pub fn new(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            journey_stage: JourneyStage::NewUser,
            preferences: Map::new(),
            interaction_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// A string preference, if set and non-empty
    pub fn preference_str(&self, key: &str) -> Option<&str> {
        self.preferences
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Declared location, from either the `location` or `country` preference
    pub fn location(&self) -> Option<&str> {
        self.preference_str("location")
            .or_else(|| self.preference_str("country"))
    }
}

/// One stored conversation turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

/// Open (creating if needed) the SQLite database at `database_url`
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {}", database_url))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    Ok(pool)
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_profiles (
            user_id INTEGER PRIMARY KEY,
            journey_stage TEXT NOT NULL DEFAULT 'new_user',
            preferences TEXT,
            interaction_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create user_profiles table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS conversation_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create conversation_history table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_conversation_history_user
         ON conversation_history (user_id, id)",
    )
    .execute(pool)
    .await
    .context("Failed to create conversation history index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_preferences(user_id: i64, raw: Option<String>) -> Map<String, Value> {
    match raw.as_deref().map(serde_json::from_str::<Value>) {
        Some(Ok(Value::Object(map))) => map,
        Some(Ok(_)) | None => Map::new(),
        Some(Err(e)) => {
            warn!(user_id, error = %e, "Stored preferences are not valid JSON");
            Map::new()
        }
    }
}

/// Read a user's profile
pub async fn get_user_profile(pool: &SqlitePool, user_id: i64) -> Result<Option<UserProfile>> {
    let row = sqlx::query(
        "SELECT user_id, journey_stage, preferences, interaction_count, created_at, updated_at
         FROM user_profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read user profile")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let journey_stage: String = row.try_get("journey_stage")?;
    let preferences: Option<String> = row.try_get("preferences")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Some(UserProfile {
        user_id: row.try_get("user_id")?,
        journey_stage: JourneyStage::parse(&journey_stage),
        preferences: parse_preferences(user_id, preferences),
        interaction_count: row.try_get("interaction_count")?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    }))
}

/// Create a profile if the user has none; existing profiles are left untouched
pub async fn create_user_profile(pool: &SqlitePool, user_id: i64) -> Result<()> {
    let now = now_rfc3339();
    let result = sqlx::query(
        "INSERT OR IGNORE INTO user_profiles
         (user_id, journey_stage, preferences, interaction_count, created_at, updated_at)
         VALUES (?, 'new_user', '{}', 0, ?, ?)",
    )
    .bind(user_id)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .context("Failed to create user profile")?;

    if result.rows_affected() > 0 {
        info!(user_id, "User profile created");
    }
    Ok(())
}

pub async fn get_or_create_user_profile(pool: &SqlitePool, user_id: i64) -> Result<UserProfile> {
    if let Some(profile) = get_user_profile(pool, user_id).await? {
        return Ok(profile);
    }

    create_user_profile(pool, user_id).await?;
    get_user_profile(pool, user_id)
        .await?
        .with_context(|| format!("User profile {} missing after creation", user_id))
}

/// Merge `updates` into the stored preferences; later keys overwrite earlier ones
pub async fn update_user_preferences(
    pool: &SqlitePool,
    user_id: i64,
    updates: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let profile = get_or_create_user_profile(pool, user_id).await?;

    let mut merged = profile.preferences;
    for (key, value) in updates {
        merged.insert(key.clone(), value.clone());
    }

    let encoded = serde_json::to_string(&merged).context("Failed to encode preferences")?;
    sqlx::query("UPDATE user_profiles SET preferences = ?, updated_at = ? WHERE user_id = ?")
        .bind(encoded)
        .bind(now_rfc3339())
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update user preferences")?;

    info!(user_id, keys = updates.len(), "User preferences updated");
    Ok(merged)
}

pub async fn update_journey_stage(pool: &SqlitePool, user_id: i64, stage: JourneyStage) -> Result<()> {
    create_user_profile(pool, user_id).await?;

    sqlx::query("UPDATE user_profiles SET journey_stage = ?, updated_at = ? WHERE user_id = ?")
        .bind(stage.as_str())
        .bind(now_rfc3339())
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update journey stage")?;

    info!(user_id, stage = stage.as_str(), "Journey stage updated");
    Ok(())
}

/// Bump the interaction counter and return its new value
pub async fn increment_interaction_count(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    create_user_profile(pool, user_id).await?;

    sqlx::query(
        "UPDATE user_profiles SET interaction_count = interaction_count + 1, updated_at = ?
         WHERE user_id = ?",
    )
    .bind(now_rfc3339())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to increment interaction count")?;

    let count: i64 = sqlx::query_scalar("SELECT interaction_count FROM user_profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to read interaction count")?;

    Ok(count)
}

pub async fn reset_interaction_count(pool: &SqlitePool, user_id: i64) -> Result<()> {
    create_user_profile(pool, user_id).await?;

    sqlx::query("UPDATE user_profiles SET interaction_count = 0, updated_at = ? WHERE user_id = ?")
        .bind(now_rfc3339())
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to reset interaction count")?;

    Ok(())
}

/// Delete a user's profile. Returns whether a profile existed.
pub async fn delete_user_profile(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM user_profiles WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete user profile")?;

    Ok(result.rows_affected() > 0)
}

pub async fn add_message_to_history(pool: &SqlitePool, user_id: i64, role: &str, content: &str) -> Result<()> {
    sqlx::query("INSERT INTO conversation_history (user_id, role, content, timestamp) VALUES (?, ?, ?, ?)")
        .bind(user_id)
        .bind(role)
        .bind(content)
        .bind(now_rfc3339())
        .execute(pool)
        .await
        .context("Failed to add message to history")?;

    Ok(())
}

/// The last `limit` messages of a user, oldest first
pub async fn get_conversation_history(pool: &SqlitePool, user_id: i64, limit: i64) -> Result<Vec<HistoryMessage>> {
    let rows = sqlx::query(
        "SELECT role, content FROM conversation_history
         WHERE user_id = ? ORDER BY id DESC LIMIT ?",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to read conversation history")?;

    let mut history = rows
        .into_iter()
        .map(|row| {
            Ok(HistoryMessage {
                role: row.try_get("role")?,
                content: row.try_get("content")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .context("Failed to decode conversation history")?;

    history.reverse();
    Ok(history)
}

/// Delete a user's history. Returns the number of removed messages.
pub async fn delete_conversation_history(pool: &SqlitePool, user_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM conversation_history WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete conversation history")?;

    info!(user_id, deleted = result.rows_affected(), "Conversation history deleted");
    Ok(result.rows_affected())
}
