//! # Funny Recipes Telegram Bot
//!
//! A Telegram bot that turns the ingredients a user has (typed, spoken or
//! photographed) into surprising, funny recipes. Every generated recipe is
//! verified for surprise and humor; weak drafts are regenerated with hints or
//! enhanced before they reach the user.

pub mod bot;
pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod enhancer;
pub mod generation;
pub mod ingredient_categories;
pub mod ingredient_intelligence;
pub mod llm;
pub mod localization;
pub mod preferences;
pub mod prompts;
pub mod recipe_parser;
pub mod surprise;
pub mod transcription;
pub mod verification;
pub mod vision;
