//! # Verification Tests
//!
//! End-to-end checks of recipe verification: parsing, surprise scoring,
//! humor detection and the hints fed back into regeneration.

use funny_recipes::db::UserProfile;
use funny_recipes::enhancer::enhance_recipe;
use funny_recipes::llm::ScriptedService;
use funny_recipes::recipe_parser::{extract_humor, extract_ingredients};
use funny_recipes::surprise::{calculate_surprise_score, has_sufficient_humor, MAX_SURPRISE_SCORE};
use funny_recipes::verification::{regeneration_hints, verify_recipe, FALLBACK_HINT, HINT_SEPARATOR};

const SURPRISING_RECIPE: &str = "\
# Chocolate Chicken Surprise (Aztec Kitchen)

**The Story:** Ancient Mesoamerican fusion meets modern madness!

**Ingredients:**
- chocolate cake
- chicken thighs
- vanilla extract
- garlic powder

**Steps:**
1. Crumble the cake over the chicken.
2. Roast until everyone at the table is confused.

**Result:** Sweet, savory and slightly scandalous.

**Plot twist:** The chicken wanted revenge on dessert because it was never invited to birthdays. 🎭
";

const PLAIN_RECIPE: &str = "\
# Chicken and Rice

**Ingredients:**
- chicken breast
- rice pilaf
- olive oil

**Steps:**
1. Cook everything.

**Result:** Dinner.
";

fn profile() -> UserProfile {
    UserProfile::new(42)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_sweet_and_meat_pairing_scores_high() {
    let score = calculate_surprise_score(
        &strings(&["chocolate cake", "chicken thighs", "vanilla extract", "garlic powder"]),
        &profile(),
    );
    assert!(score > 0.8);
    assert!((score - 5.6 / 6.0).abs() < 1e-9);
}

#[test]
fn test_plain_pairing_scores_lower() {
    let surprising = calculate_surprise_score(
        &strings(&["chocolate cake", "chicken thighs", "vanilla extract", "garlic powder"]),
        &profile(),
    );
    let plain = calculate_surprise_score(&strings(&["chicken breast", "rice pilaf", "olive oil"]), &profile());

    assert!((plain - 0.6).abs() < 1e-9);
    assert!(plain < surprising);
}

#[test]
fn test_fewer_than_two_ingredients_score_zero() {
    assert_eq!(calculate_surprise_score(&[], &profile()), 0.0);
    assert_eq!(calculate_surprise_score(&strings(&["chocolate"]), &profile()), 0.0);
    assert_eq!(calculate_surprise_score(&strings(&["(unknown)", "chicken"]), &profile()), 0.0);
}

#[test]
fn test_score_stays_in_range_and_ignores_order() {
    let lists = [
        strings(&["chocolate", "chicken", "shrimp", "candy", "honey"]),
        strings(&["mystery dust", "moon rock"]),
        strings(&["milk", "cheese", "butter"]),
        strings(&["sugar", "salmon"]),
    ];

    for list in &lists {
        let score = calculate_surprise_score(list, &profile());
        assert!((0.0..=MAX_SURPRISE_SCORE).contains(&score), "score {} out of range", score);

        let mut reversed = list.clone();
        reversed.reverse();
        let reversed_score = calculate_surprise_score(&reversed, &profile());
        assert!((score - reversed_score).abs() < 1e-9);
    }
}

/// Every ordering of `items`
fn permutations(items: &[String]) -> Vec<Vec<String>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut all = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let first = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first.clone());
            all.push(tail);
        }
    }
    all
}

#[test]
fn test_score_is_the_same_for_every_ordering() {
    let list = strings(&["chocolate cake", "chicken thighs", "shrimp", "garlic powder"]);
    let expected = calculate_surprise_score(&list, &profile());
    assert!(expected > 0.0);

    let orderings = permutations(&list);
    assert_eq!(orderings.len(), 24);
    for ordering in &orderings {
        let score = calculate_surprise_score(ordering, &profile());
        assert!((score - expected).abs() < 1e-9, "{:?} scored {}", ordering, score);
    }
}

#[test]
fn test_surprising_recipe_is_accepted() {
    let result = verify_recipe(SURPRISING_RECIPE, &profile());

    assert_eq!(result.ingredients.len(), 4);
    assert!(result.surprise_score > 0.8);
    assert!(result.has_humor);
    assert!(!result.needs_enhancement);
    assert!(result.enhancement_suggestions.is_empty());
    assert!(result.is_accepted());
    assert_eq!(result.original_recipe, SURPRISING_RECIPE);
}

#[test]
fn test_plain_recipe_needs_humor() {
    let result = verify_recipe(PLAIN_RECIPE, &profile());

    assert!(!result.lacks_surprise());
    assert!(!result.has_humor);
    assert!(result.needs_enhancement);
    assert_eq!(result.enhancement_suggestions.len(), 1);
}

#[test]
fn test_five_bullet_ingredient_section() {
    let recipe = "**Ingredients:**\n- 1 banana\n- 2 eggs\n- soy sauce\n- dark chocolate\n- 3 shrimp\n**Steps:**\n1. Mix";
    assert_eq!(
        extract_ingredients(recipe),
        vec!["1 banana", "2 eggs", "soy sauce", "dark chocolate", "3 shrimp"]
    );
}

#[test]
fn test_malformed_text_yields_empty_verification() {
    let result = verify_recipe("Hello! What's in your fridge today?", &profile());
    assert!(result.ingredients.is_empty());
    assert!(result.humor_text.is_empty());
    assert_eq!(result.surprise_score, 0.0);
    assert!(!result.has_humor);
    assert_eq!(result.enhancement_suggestions.len(), 2);
}

#[test]
fn test_humor_extraction_and_detection() {
    let humor = extract_humor(SURPRISING_RECIPE);
    assert!(humor.contains("Plot twist"));
    assert!(humor.contains("**Result:**"));
    assert!(has_sufficient_humor(&humor));

    assert!(!has_sufficient_humor(""));
    assert!(!has_sufficient_humor("A perfectly ordinary dinner."));
    assert!(has_sufficient_humor("A twist nobody saw coming, because why not"));
    assert!(has_sufficient_humor("Serve it 🔥"));
}

#[test]
fn test_hints_escalate_with_attempts() {
    let result = verify_recipe("nothing to see here", &profile());

    let first = regeneration_hints(&result, 1);
    let second = regeneration_hints(&result, 2);
    assert!(first.contains(HINT_SEPARATOR));
    assert!(second.len() > first.len());
    assert!(second.starts_with(&first[..first.find(HINT_SEPARATOR).unwrap_or(first.len())]));
}

#[test]
fn test_hints_fall_back_when_nothing_failed() {
    let result = verify_recipe(SURPRISING_RECIPE, &profile());
    assert_eq!(regeneration_hints(&result, 1), FALLBACK_HINT);
}

#[tokio::test]
async fn test_enhance_is_noop_for_accepted_recipe() {
    let service = ScriptedService::new().reply("rewritten");
    let result = verify_recipe(SURPRISING_RECIPE, &profile());

    let enhanced = enhance_recipe(&service, SURPRISING_RECIPE, &result).await;

    assert_eq!(enhanced, SURPRISING_RECIPE);
    assert_eq!(service.call_count(), 0);
}
