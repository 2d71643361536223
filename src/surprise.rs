//! # Surprise Scoring and Humor Detection
//!
//! Heuristics that judge a generated recipe: how unexpected its ingredient
//! pairings are, and whether its narrative passages carry enough jokes.
//!
//! The pair weights were hand-tuned together with the generation prompt and are
//! treated as configuration: [`PairWeights::default`] is the reference tuning.

use tracing::debug;

use crate::db::UserProfile;
use crate::ingredient_categories::{categorize, Category};

/// Upper bound of the surprise score
pub const MAX_SURPRISE_SCORE: f64 = 2.0;

/// Minimum score for a recipe to count as surprising
pub const SURPRISE_THRESHOLD: f64 = 0.5;

/// Distinct indicator words needed when no indicator emoji is present
pub const MIN_HUMOR_INDICATORS: usize = 2;

pub const HUMOR_INDICATORS: &[&str] = &[
    "twist",
    "revenge",
    "rebellion",
    "plot",
    "joke",
    "humor",
    "funny",
    "laugh",
    "surprise",
    "unexpected",
    "because",
    "would've",
];

pub const HUMOR_EMOJI: &[char] = &['🌊', '🌮', '🍷', '🎭', '✨', '🔥'];

/// Score added for each kind of ingredient pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairWeights {
    /// At least one side could not be categorized
    pub neutral: f64,
    /// Both sides in the same category
    pub same_category: f64,
    /// Sweets against meats or seafood
    pub sweet_and_savory: f64,
    /// Any other pair of distinct categories
    pub cross_category: f64,
}

impl Default for PairWeights {
    fn default() -> Self {
        Self {
            neutral: 0.5,
            same_category: 0.2,
            sweet_and_savory: 1.5,
            cross_category: 0.8,
        }
    }
}

impl PairWeights {
    /// Weight for a pair of categories; symmetric in its arguments
    pub fn pair_score(&self, first: Category, second: Category) -> f64 {
        if !first.is_known() || !second.is_known() {
            self.neutral
        } else if first == second {
            self.same_category
        } else if (first == Category::Sweets && second.is_savory_protein())
            || (second == Category::Sweets && first.is_savory_protein())
        {
            self.sweet_and_savory
        } else {
            self.cross_category
        }
    }
}

/// Scores ingredient lists by how surprising their category pairings are
#[derive(Debug, Clone, Default)]
pub struct SurpriseScorer {
    weights: PairWeights,
}

impl SurpriseScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: PairWeights) -> Self {
        Self { weights }
    }

    /// Mean pair score over every unordered pair of normalized ingredients,
    /// clamped to [`MAX_SURPRISE_SCORE`].
    ///
    /// The profile is accepted so that scoring can later weigh declared tastes;
    /// it is not read today.
    pub fn score(&self, ingredients: &[String], _profile: &UserProfile) -> f64 {
        let categories: Vec<Category> = ingredients
            .iter()
            .filter_map(|ingredient| normalize_ingredient(ingredient))
            .map(|word| categorize(&word))
            .collect();

        if categories.len() < 2 {
            return 0.0;
        }

        let mut total = 0.0;
        let mut pairs = 0usize;
        for (i, first) in categories.iter().enumerate() {
            for second in &categories[i + 1..] {
                total += self.weights.pair_score(*first, *second);
                pairs += 1;
            }
        }

        let score = (total / pairs as f64).min(MAX_SURPRISE_SCORE);
        debug!(pairs, score, "Surprise score computed");
        score
    }
}

/// Reduce an ingredient description to its lower-cased head word.
///
/// Drops everything after the first comma or opening parenthesis, so
/// "50g dark chocolate (70%+)" becomes "50g" and "Chocolate cake, iced"
/// becomes "chocolate". Returns `None` when nothing is left.
pub fn normalize_ingredient(description: &str) -> Option<String> {
    let head = description.split(',').next().unwrap_or_default();
    let head = head.split('(').next().unwrap_or_default();
    head.to_lowercase()
        .split_whitespace()
        .next()
        .map(str::to_string)
}

/// Surprise score with the reference weights
pub fn calculate_surprise_score(ingredients: &[String], profile: &UserProfile) -> f64 {
    SurpriseScorer::new().score(ingredients, profile)
}

/// Number of distinct indicator words present in the text (case-insensitive)
pub fn count_humor_indicators(humor_text: &str) -> usize {
    let lowered = humor_text.to_lowercase();
    HUMOR_INDICATORS
        .iter()
        .filter(|indicator| lowered.contains(*indicator))
        .count()
}

/// Generous humor check: enough indicator words or any indicator emoji.
pub fn has_sufficient_humor(humor_text: &str) -> bool {
    if humor_text.is_empty() {
        return false;
    }

    let has_emoji = humor_text.chars().any(|c| HUMOR_EMOJI.contains(&c));
    count_humor_indicators(humor_text) >= MIN_HUMOR_INDICATORS || has_emoji
}
