//! # Configuration Module
//!
//! Runtime settings for the bot, read from the environment (optionally seeded
//! from a `.env` file outside production).

use anyhow::{bail, Context, Result};
use std::str::FromStr;

// Defaults for optional settings
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-haiku";
pub const DEFAULT_VISION_MODEL: &str = "google/gemini-2.0-flash-exp:free";
pub const DEFAULT_AUDIO_MODEL: &str = "whisper-1";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_MAX_TOKENS: u32 = 10000;
pub const DEFAULT_MAX_CONTEXT_MESSAGES: i64 = 30;
pub const DEFAULT_INTERACTION_LIMIT: i64 = 30;
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 3;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://user_data.db";
pub const DEFAULT_LOCALES_DIR: &str = "./locales";

/// Recovery configuration for calls to remote services
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryConfig {
    /// Timeout for a single request in seconds
    pub request_timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Settings for the completion and vision models
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub vision_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub recovery: RecoveryConfig,
}

impl LlmConfig {
    /// Configuration against a given endpoint with default model settings
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            recovery: RecoveryConfig::default(),
        }
    }
}

/// Settings for speech transcription
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Complete bot configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub telegram_token: String,
    pub llm: LlmConfig,
    pub transcription: TranscriptionConfig,
    pub max_context_messages: i64,
    pub interaction_limit: i64,
    pub max_generation_attempts: u32,
    pub database_url: String,
    pub locales_dir: String,
    pub log_format: LogFormat,
}

/// Load `.env` unless running in production
pub fn load_env() {
    if std::env::var("ENV").as_deref() != Ok("production") {
        dotenv::dotenv().ok();
    }
}

impl BotConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => bail!("Missing required environment variable: {}", key),
            }
        };
        let optional = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let telegram_token = required("TELEGRAM_BOT_TOKEN")?;
        let openrouter_key = required("OPENROUTER_API_KEY")?;
        let openai_key = required("OPENAI_API_KEY")?;

        let recovery = RecoveryConfig {
            request_timeout_secs: parse_or(&lookup, "LLM_TIMEOUT_SECS", 60)?,
            circuit_breaker_threshold: parse_or(&lookup, "LLM_BREAKER_THRESHOLD", 5)?,
            circuit_breaker_reset_secs: parse_or(&lookup, "LLM_BREAKER_RESET_SECS", 60)?,
        };

        let llm = LlmConfig {
            api_key: openrouter_key,
            base_url: optional("OPENROUTER_BASE_URL", DEFAULT_OPENROUTER_BASE_URL),
            model: optional("OPENROUTER_MODEL", DEFAULT_MODEL),
            vision_model: optional("OPENROUTER_VISION_MODEL", DEFAULT_VISION_MODEL),
            temperature: parse_or(&lookup, "LLM_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            max_tokens: parse_or(&lookup, "LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            recovery,
        };

        let transcription = TranscriptionConfig {
            api_key: openai_key,
            base_url: optional("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            model: optional("OPENROUTER_AUDIO_MODEL", DEFAULT_AUDIO_MODEL),
        };

        let log_format = match optional("LOG_FORMAT", "text").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let max_generation_attempts: u32 =
            parse_or(&lookup, "MAX_GENERATION_ATTEMPTS", DEFAULT_MAX_GENERATION_ATTEMPTS)?;
        if max_generation_attempts == 0 {
            bail!("MAX_GENERATION_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            telegram_token,
            llm,
            transcription,
            max_context_messages: parse_or(&lookup, "MAX_CONTEXT_MESSAGES", DEFAULT_MAX_CONTEXT_MESSAGES)?,
            interaction_limit: parse_or(&lookup, "INTERACTION_LIMIT", DEFAULT_INTERACTION_LIMIT)?,
            max_generation_attempts,
            database_url: optional("DATABASE_URL", DEFAULT_DATABASE_URL),
            locales_dir: optional("LOCALES_DIR", DEFAULT_LOCALES_DIR),
            log_format,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ("OPENROUTER_API_KEY", "or-key"),
        ("OPENAI_API_KEY", "oa-key"),
    ];

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.vision_model, DEFAULT_VISION_MODEL);
        assert_eq!(config.llm.max_tokens, 10000);
        assert!((config.llm.temperature - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.llm.recovery, RecoveryConfig::default());
        assert_eq!(config.transcription.model, "whisper-1");
        assert_eq!(config.max_context_messages, 30);
        assert_eq!(config.interaction_limit, 30);
        assert_eq!(config.max_generation_attempts, 3);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.locales_dir, "./locales");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_missing_required_variable() {
        let err = BotConfig::from_lookup(lookup_from(&REQUIRED[..2])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(&[
            ("OPENROUTER_MODEL", "openai/gpt-4o-mini"),
            ("LLM_MAX_TOKENS", "2000"),
            ("MAX_GENERATION_ATTEMPTS", "5"),
            ("LOG_FORMAT", "JSON"),
            ("LLM_BREAKER_THRESHOLD", "2"),
        ]);
        let config = BotConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 2000);
        assert_eq!(config.max_generation_attempts, 5);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.llm.recovery.circuit_breaker_threshold, 2);
    }

    #[test]
    fn test_invalid_number_is_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LLM_TEMPERATURE", "warm"));
        let err = BotConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("LLM_TEMPERATURE"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MAX_GENERATION_ATTEMPTS", "0"));
        assert!(BotConfig::from_lookup(lookup_from(&pairs)).is_err());
    }
}
