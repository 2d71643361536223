//! # Recipe Parser
//!
//! Pulls the ingredient bullets and the humorous passages out of a generated
//! recipe. The recipe format is a contract with the generation prompt:
//!
//! ```text
//! # <Name> (<Context>)
//! **The Story:** ...
//! **Ingredients:**
//! - item 1
//! - item 2
//! **Steps:**
//! 1. ...
//! **Result:** ...
//! **Plot twist...**
//! 🌊 **Regional Version**: ...
//! ```
//!
//! Malformed text is never an error: missing sections produce empty output.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

/// Marker that opens the ingredients section
pub const INGREDIENTS_MARKER: &str = "**Ingredients:**";

lazy_static! {
    static ref INGREDIENTS_SECTION: Regex = Regex::new(
        r"(?s)\*\*Ingredients:\*\*(.*?)(?:\*\*Steps|\*\*Result|\*\*The Story|\z)"
    )
    .expect("Ingredients section pattern should be valid");

    /// Humor-bearing blocks, scanned in this order
    static ref HUMOR_PATTERNS: Vec<Regex> = [
        r"(?s)Plot twist.*?(?:\n\n|\z)",
        r"(?s)\*\*Result:\*\*.*?(?:\n\n|\z)",
        r"(?s)🌊.*?(?:\n\n|\z)",
        r"(?s)🌮.*?(?:\n\n|\z)",
        r"(?s)🍷.*?(?:\n\n|\z)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("Humor pattern should be valid"))
    .collect();
}

/// Whether the text carries an ingredients section at all
pub fn looks_like_recipe(recipe_text: &str) -> bool {
    recipe_text.contains(INGREDIENTS_MARKER)
}

/// Extract the bullet items of the `**Ingredients:**` section.
///
/// # Examples
///
/// ```rust
/// use funny_recipes::recipe_parser::extract_ingredients;
///
/// let recipe = "**Ingredients:**\n- 2 chicken thighs\n- dark chocolate\n**Steps:**\n1. Cook";
/// assert_eq!(extract_ingredients(recipe), vec!["2 chicken thighs", "dark chocolate"]);
/// ```
pub fn extract_ingredients(recipe_text: &str) -> Vec<String> {
    let Some(section) = INGREDIENTS_SECTION
        .captures(recipe_text)
        .and_then(|captures| captures.get(1))
    else {
        trace!("No ingredients section found");
        return Vec::new();
    };

    section
        .as_str()
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('-'))
        .map(|ingredient| ingredient.trim().to_string())
        .collect()
}

/// Collect the plot twist, result and variation passages, newline-joined.
pub fn extract_humor(recipe_text: &str) -> String {
    let passages: Vec<&str> = HUMOR_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.find_iter(recipe_text))
        .map(|found| found.as_str().trim())
        .collect();

    trace!(passages = passages.len(), "Humor passages extracted");
    passages.join("\n")
}
