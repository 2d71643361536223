//! # Ingredient Categories
//!
//! Static keyword table used to place an ingredient word into a food category
//! for pairing analysis. Lookup is an ordered scan: the first category owning a
//! keyword contained in the word wins, so the table order is part of the
//! behaviour (e.g. "cream" resolves to dairy, never to sweets).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Food category used by the surprise scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Meats,
    Seafood,
    Dairy,
    Sweets,
    Fruits,
    Vegetables,
    Grains,
    Spices,
    Sauces,
    Unknown,
}

/// Ordered category table. Do not reorder without re-checking overlapping keywords.
const CATEGORY_TABLE: &[(Category, &[&str])] = &[
    (
        Category::Meats,
        &["chicken", "beef", "pork", "meat", "steak", "lamb", "turkey", "duck", "jerky"],
    ),
    (
        Category::Seafood,
        &["fish", "shrimp", "seafood", "salmon", "tuna", "cod", "lobster"],
    ),
    (
        Category::Dairy,
        &["milk", "cheese", "yogurt", "cream", "butter", "mozzarella", "cheddar", "ice"],
    ),
    (
        Category::Sweets,
        &["chocolate", "sugar", "candy", "dessert", "sweet", "cake", "vanilla", "honey", "cream"],
    ),
    (
        Category::Fruits,
        &["apple", "banana", "orange", "berry", "fruit", "mango", "peach", "strawberry", "strawberries"],
    ),
    (
        Category::Vegetables,
        &["carrot", "broccoli", "spinach", "vegetable", "lettuce", "tomato", "onion"],
    ),
    (
        Category::Grains,
        &["rice", "bread", "pasta", "wheat", "quinoa", "oats"],
    ),
    (
        Category::Spices,
        &["cumin", "paprika", "cinnamon", "garlic", "ginger", "basil", "oregano"],
    ),
    (
        Category::Sauces,
        &["sauce", "ketchup", "mustard", "mayo", "soy"],
    ),
];

impl Category {
    /// Every resolvable category in lookup order (excludes `Unknown`)
    pub fn all() -> impl Iterator<Item = Category> {
        CATEGORY_TABLE.iter().map(|(category, _)| *category)
    }

    /// Keywords owned by this category
    pub fn keywords(self) -> &'static [&'static str] {
        CATEGORY_TABLE
            .iter()
            .find(|(category, _)| *category == self)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }

    pub fn is_known(self) -> bool {
        self != Category::Unknown
    }

    /// Savory proteins that clash most with sweets
    pub fn is_savory_protein(self) -> bool {
        matches!(self, Category::Meats | Category::Seafood)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Meats => "meats",
            Category::Seafood => "seafood",
            Category::Dairy => "dairy",
            Category::Sweets => "sweets",
            Category::Fruits => "fruits",
            Category::Vegetables => "vegetables",
            Category::Grains => "grains",
            Category::Spices => "spices",
            Category::Sauces => "sauces",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a normalized (lower-cased) ingredient word to its category.
///
/// Matching is substring containment of a keyword inside the word, so
/// "meatballs" resolves through "meat" and "rice" is caught by the dairy
/// keyword "ice" before the grains row is reached.
pub fn categorize(word: &str) -> Category {
    CATEGORY_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| word.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Unknown)
}
