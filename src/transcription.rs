//! Speech-to-text through the OpenAI Whisper API.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use crate::config::TranscriptionConfig;
use crate::llm::LlmError;

/// File name announced for Telegram voice notes (OGG/Opus)
pub const VOICE_FILE_NAME: &str = "voice_message.ogg";

const TRANSCRIPTION_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug)]
pub struct WhisperClient {
    config: TranscriptionConfig,
    client: reqwest::Client,
}

impl WhisperClient {
    pub fn new(config: TranscriptionConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TRANSCRIPTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Transcribe an OGG voice note; returns the trimmed text
    pub async fn transcribe(&self, audio: Vec<u8>) -> Result<String, LlmError> {
        let size = audio.len();
        let part = Part::bytes(audio)
            .file_name(VOICE_FILE_NAME)
            .mime_str("audio/ogg")
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let form = Form::new().text("model", self.config.model.clone()).part("file", part);

        let url = format!("{}/audio/transcriptions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(TRANSCRIPTION_TIMEOUT_SECS)
                } else {
                    LlmError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            return Err(LlmError::RateLimited { retry_after_secs: None });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(LlmError::ApiError { status, message: body });
        }

        let parsed: TranscriptionResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::ParseError(e.to_string()))?;
        let text = parsed.text.trim().to_string();

        info!(bytes = size, chars = text.chars().count(), "Voice message transcribed");
        Ok(text)
    }
}
