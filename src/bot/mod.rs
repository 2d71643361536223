//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `conversation`: The per-turn pipeline (history, limits, generation, preferences)
//! - `message_handler`: Handles incoming text, voice, photo, and document messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages
//! - `dialogue_manager`: Handles the photo ingredient review dialogue

pub mod callback_handler;
pub mod conversation;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::{message_handler, AppState};

pub use conversation::{handle_user_turn, ConversationSettings, TurnOutcome};
pub use ui_builder::{create_ingredient_review_keyboard, format_ingredients_list, split_message};
