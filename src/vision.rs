//! # Photo Ingredient Recognition
//!
//! Shrinks a photo, ships it to the vision model as a data URL and turns the
//! comma-separated answer into an ingredient list.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{GenericImageView, ImageOutputFormat};
use std::io::Cursor;
use tracing::info;

use crate::llm::{LlmError, OpenRouterClient};
use crate::prompts::VISION_PROMPT;

/// Longest image side sent to the model
pub const MAX_IMAGE_SIDE: u32 = 512;

pub const VISION_MAX_TOKENS: u32 = 500;

/// Decode `image_bytes`, shrink it into a `MAX_IMAGE_SIDE` square and re-encode as PNG
pub fn prepare_image(image_bytes: &[u8]) -> Result<Vec<u8>, LlmError> {
    let image = image::load_from_memory(image_bytes).map_err(|e| LlmError::InvalidImage(e.to_string()))?;
    let (width, height) = image.dimensions();
    let thumbnail = if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
        image.thumbnail(MAX_IMAGE_SIDE, MAX_IMAGE_SIDE)
    } else {
        image
    };

    let mut buffer = Cursor::new(Vec::new());
    thumbnail
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .map_err(|e| LlmError::InvalidImage(e.to_string()))?;

    Ok(buffer.into_inner())
}

pub fn png_data_url(png_bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png_bytes))
}

/// Split the model's answer into ingredients; an empty answer or
/// "no ingredients found" means nothing was recognized.
pub fn parse_identified_ingredients(answer: &str) -> Vec<String> {
    let answer = answer.trim();
    if answer.is_empty() || answer.to_lowercase().contains("no ingredients found") {
        return Vec::new();
    }

    answer
        .split(',')
        .map(|item| item.trim().trim_end_matches('.').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Recognize the ingredients shown in a photo
pub async fn identify_ingredients_from_photo(client: &OpenRouterClient, image_bytes: &[u8]) -> Result<Vec<String>, LlmError> {
    let png = prepare_image(image_bytes)?;
    let answer = client
        .describe_image(VISION_PROMPT, &png_data_url(&png), VISION_MAX_TOKENS)
        .await?;

    let ingredients = parse_identified_ingredients(&answer);
    info!(count = ingredients.len(), "Vision model identified ingredients");
    Ok(ingredients)
}
