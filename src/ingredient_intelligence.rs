//! # Local Ingredient Intelligence
//!
//! Regional ingredient tables used to slip one or two surprising local items
//! into a recipe, plus a one-line cultural backdrop for the story.

use rand::seq::SliceRandom;
use rand::Rng;

pub const DEFAULT_CULTURAL_CONTEXT: &str = "Global fusion traditions meet local wisdom";

/// Number of local ingredients suggested per recipe
pub const DEFAULT_SURPRISE_COUNT: usize = 2;

struct Region {
    key: &'static str,
    ingredients: &'static [&'static str],
    context: &'static str,
}

const REGIONS: &[Region] = &[
    Region {
        key: "italy",
        ingredients: &["parmigiano-reggiano", "balsamic vinegar", "prosciutto", "basil", "pine nuts", "mascarpone", "pancetta", "romano cheese"],
        context: "Ancient Roman spice routes meet Renaissance creativity",
    },
    Region {
        key: "mexico",
        ingredients: &["lime", "cilantro", "jalapeños", "avocado", "queso fresco", "chipotle", "poblano peppers", "mexican crema"],
        context: "Aztec traditions meet Spanish conquistador influences",
    },
    Region {
        key: "france",
        ingredients: &["butter", "thyme", "shallots", "crème fraîche", "herbs de provence", "calvados", "roquefort", "tarragon"],
        context: "Medieval guild techniques refined by royal chefs",
    },
    Region {
        key: "india",
        ingredients: &["curry leaves", "tamarind", "cumin seeds", "coconut", "cardamom", "garam masala", "ghee", "mustard seeds"],
        context: "Silk Road spices meet Mughal imperial kitchens",
    },
    Region {
        key: "japan",
        ingredients: &["miso paste", "nori", "mirin", "sesame oil", "shiitake", "dashi", "sake", "wasabi"],
        context: "Zen Buddhist simplicity meets samurai precision",
    },
    Region {
        key: "thailand",
        ingredients: &["fish sauce", "lemongrass", "coconut milk", "thai basil", "galangal", "palm sugar", "lime leaves", "bird's eye chili"],
        context: "Royal Thai court cuisine meets street vendor wisdom",
    },
    Region {
        key: "greece",
        ingredients: &["feta", "olive oil", "oregano", "olives", "lemon", "capers", "dill", "kasseri cheese"],
        context: "Ancient Mediterranean trading post flavors",
    },
    Region {
        key: "morocco",
        ingredients: &["preserved lemons", "harissa", "ras el hanout", "dates", "almonds", "rose water", "orange blossom", "argan oil"],
        context: "Berber nomad traditions meet Arabic palace cuisine",
    },
    Region {
        key: "china",
        ingredients: &["soy sauce", "ginger", "star anise", "five-spice", "rice wine", "black vinegar", "scallions", "sesame seeds"],
        context: "Imperial Forbidden City meets regional diversity",
    },
    Region {
        key: "spain",
        ingredients: &["saffron", "sherry vinegar", "marcona almonds", "pimentón", "jamón ibérico", "manchego", "romesco", "membrillo"],
        context: "Moorish influences meet New World discoveries",
    },
    Region {
        key: "lebanon",
        ingredients: &["sumac", "za'atar", "pomegranate molasses", "tahini", "arak", "rose petals", "pistachios", "labneh"],
        context: "Phoenician traders meet Ottoman empire flavors",
    },
    Region {
        key: "peru",
        ingredients: &["ají amarillo", "quinoa", "purple potatoes", "lucuma", "pisco", "huacatay", "rocoto peppers", "chicha morada"],
        context: "Incan mountain wisdom meets coastal abundance",
    },
    Region {
        key: "korea",
        ingredients: &["gochujang", "kimchi", "sesame oil", "perilla", "doenjang", "rice wine", "napa cabbage", "korean pear"],
        context: "Royal court cuisine meets fermentation mastery",
    },
    Region {
        key: "turkey",
        ingredients: &["sumac", "pomegranate molasses", "bulgur", "turkish coffee", "raki", "pistachios", "dried apricots", "urfa biber"],
        context: "Ottoman sultan's kitchen meets nomadic traditions",
    },
    Region {
        key: "brazil",
        ingredients: &["açaí", "cachaça", "dendê oil", "hearts of palm", "cashews", "coconut", "lime", "malagueta peppers"],
        context: "Indigenous ingredients meet Portuguese colonial fusion",
    },
];

/// Demonyms and spellings mapped to table keys, checked in order by containment.
/// Entries pointing at keys without a table (e.g. "usa") resolve to nothing.
const LOCATION_ALIASES: &[(&str, &str)] = &[
    ("mexican", "mexico"),
    ("italia", "italy"),
    ("italian", "italy"),
    ("french", "france"),
    ("indian", "india"),
    ("japanese", "japan"),
    ("thai", "thailand"),
    ("greek", "greece"),
    ("moroccan", "morocco"),
    ("chinese", "china"),
    ("spanish", "spain"),
    ("lebanese", "lebanon"),
    ("peruvian", "peru"),
    ("korean", "korea"),
    ("south korea", "korea"),
    ("turkish", "turkey"),
    ("brazilian", "brazil"),
    ("usa", "usa"),
    ("america", "usa"),
    ("united states", "usa"),
];

fn region(key: &str) -> Option<&'static Region> {
    REGIONS.iter().find(|region| region.key == key)
}

/// Map a free-form location to a table key, if one is known.
///
/// ```rust
/// use funny_recipes::ingredient_intelligence::normalize_location;
///
/// assert_eq!(normalize_location("  Japan "), Some("japan"));
/// assert_eq!(normalize_location("I'm Mexican"), Some("mexico"));
/// assert_eq!(normalize_location("Atlantis"), None);
/// ```
pub fn normalize_location(location: &str) -> Option<&'static str> {
    let lowered = location.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    if let Some(region) = region(&lowered) {
        return Some(region.key);
    }

    // The first matching alias decides, even when it points at a key without a table
    if let Some((_, key)) = LOCATION_ALIASES.iter().find(|(alias, _)| lowered.contains(alias)) {
        return region(key).map(|region| region.key);
    }

    // Free text such as "Lyon, France"
    REGIONS
        .iter()
        .find(|region| lowered.contains(region.key))
        .map(|region| region.key)
}

/// Whether the user already mentioned something overlapping `candidate`
fn already_mentioned(candidate: &str, user_ingredients: &[String]) -> bool {
    user_ingredients.iter().any(|user_ingredient| {
        candidate.contains(user_ingredient.as_str())
            || user_ingredient.contains(candidate)
            || user_ingredient
                .split_whitespace()
                .any(|word| word.chars().count() > 3 && candidate.contains(word))
    })
}

/// Local ingredients the user has not mentioned, in table order
pub fn surprise_candidates(location: &str, user_ingredients: &[String]) -> Vec<&'static str> {
    let Some(region) = normalize_location(location).and_then(region) else {
        return Vec::new();
    };

    let user_ingredients: Vec<String> = user_ingredients
        .iter()
        .map(|ingredient| ingredient.trim().to_lowercase())
        .filter(|ingredient| !ingredient.is_empty())
        .collect();

    region
        .ingredients
        .iter()
        .copied()
        .filter(|candidate| !already_mentioned(&candidate.to_lowercase(), &user_ingredients))
        .collect()
}

/// Pick up to `count` surprising local ingredients using `rng`
pub fn select_surprise_ingredients_with<R: Rng + ?Sized>(
    location: &str,
    user_ingredients: &[String],
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let candidates = surprise_candidates(location, user_ingredients);
    if candidates.len() <= count {
        return candidates.into_iter().map(str::to_string).collect();
    }

    candidates
        .choose_multiple(rng, count)
        .map(|ingredient| ingredient.to_string())
        .collect()
}

/// Pick up to `count` surprising local ingredients at random
pub fn select_surprise_ingredients(location: &str, user_ingredients: &[String], count: usize) -> Vec<String> {
    select_surprise_ingredients_with(location, user_ingredients, count, &mut rand::thread_rng())
}

pub fn cultural_context(location: &str) -> &'static str {
    normalize_location(location)
        .and_then(region)
        .map(|region| region.context)
        .unwrap_or(DEFAULT_CULTURAL_CONTEXT)
}

pub fn available_locations() -> Vec<&'static str> {
    REGIONS.iter().map(|region| region.key).collect()
}

pub fn has_local_ingredients(location: &str) -> bool {
    normalize_location(location).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location("Italy"), Some("italy"));
        assert_eq!(normalize_location("Lebanese"), Some("lebanon"));
        assert_eq!(normalize_location("Seoul, South Korea"), Some("korea"));
        assert_eq!(normalize_location("United States"), None);
        assert_eq!(normalize_location("Athens, Greece"), Some("greece"));
        assert_eq!(normalize_location(""), None);
    }

    #[test]
    fn test_tables_are_complete() {
        let locations = available_locations();
        assert_eq!(locations.len(), 15);
        for location in locations {
            assert_eq!(region(location).map(|r| r.ingredients.len()), Some(8));
            assert_ne!(cultural_context(location), DEFAULT_CULTURAL_CONTEXT);
        }
    }

    #[test]
    fn test_cultural_context_fallback() {
        assert_eq!(cultural_context("Peruvian"), "Incan mountain wisdom meets coastal abundance");
        assert_eq!(cultural_context("Mars"), DEFAULT_CULTURAL_CONTEXT);
    }

    #[test]
    fn test_candidates_skip_mentioned_ingredients() {
        let candidates = surprise_candidates("greece", &list(&["Feta cheese", "fresh LEMON", "oil"]));
        assert!(!candidates.contains(&"feta"));
        assert!(!candidates.contains(&"lemon"));
        // "oil" is a substring of "olive oil"
        assert!(!candidates.contains(&"olive oil"));
        // "cheese" is a long shared word with "kasseri cheese"
        assert!(!candidates.contains(&"kasseri cheese"));
        assert!(candidates.contains(&"oregano"));
    }

    #[test]
    fn test_short_words_do_not_filter() {
        let candidates = surprise_candidates("japan", &list(&["a big egg"]));
        assert_eq!(candidates.len(), 8);
    }

    #[test]
    fn test_select_is_bounded_and_seeded() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = select_surprise_ingredients_with("morocco", &[], 2, &mut rng);
        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0], picked[1]);

        let all = select_surprise_ingredients("morocco", &[], 20);
        assert_eq!(all.len(), 8);

        assert!(select_surprise_ingredients("nowhere", &[], 2).is_empty());
        assert!(has_local_ingredients("thai food"));
        assert!(!has_local_ingredients("nowhere"));
    }
}
