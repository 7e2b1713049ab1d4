//! Offline filter extraction from vocabulary and regex rules

use super::FilterExtractor;
use crate::error::Result;
use crate::filters::vocabulary::{self, contains_phrase, contains_term};
use crate::filters::{Filters, TagSet};
use crate::ranking::requested_count;
use regex::Regex;
use std::sync::OnceLock;

/// Categories used when a generic meal request names none
pub const DEFAULT_MEAL_TAGS: &[&str] = &["mains", "soups", "salads"];

/// A "quick" request without an explicit time
const QUICK_MAX_MINUTES: u32 = 30;

/// Rating floor for "good rating", "top rated" and similar
const GOOD_RATING: f64 = 4.0;

/// (phrase, category tag)
const CATEGORY_TERMS: &[(&str, &str)] = &[
    ("breakfast", "breakfast"),
    ("brunch", "breakfast"),
    ("dessert", "desserts"),
    ("cake", "desserts"),
    ("sweet", "desserts"),
    ("pastry", "desserts"),
    ("soup", "soups"),
    ("salad", "salads"),
    ("drink", "drinks"),
    ("smoothie", "drinks"),
    ("cocktail", "drinks"),
    ("side dish", "side dishes"),
    ("sides", "side dishes"),
];

const DESSERT_TERMS: &[&str] = &["dessert", "cake", "sweet", "pastry", "cookie", "brownie"];

/// Dish types matched by title instead of category
const DISH_TYPES: &[&str] = &[
    "pasta", "rice", "pizza", "curry", "risotto", "stew", "lasagne", "lasagna", "noodle",
    "burger", "taco", "pancake", "muffin", "bread", "quiche", "casserole", "chili",
];

const GENERIC_MEAL_TERMS: &[&str] = &["recipe", "meal", "lunch", "dinner", "supper"];

/// (phrase, dietary tag)
const DIETARY_PHRASES: &[(&str, &str)] = &[
    ("vegetarian", "vegetarian"),
    ("veggie", "vegetarian"),
    ("vegan", "vegan"),
    ("gluten free", "gluten-free"),
    ("dairy free", "lactose-free"),
    ("lactose free", "lactose-free"),
    ("nut free", "nut-free"),
    ("sugar free", "sugar-free"),
];

const RATING_PHRASES: &[&str] = &[
    "good rating",
    "good ratings",
    "high rating",
    "highly rated",
    "well rated",
    "top rated",
    "best rated",
    "good reviews",
];

/// Words that end an ingredient list after "with"
const INGREDIENT_STOP: &[&str] = &[
    "and", "under", "over", "in", "less", "more", "than", "no", "that", "which", "minutes",
    "minute", "min", "mins", "hour", "hours", "rating", "ratings", "reviews", "high", "low",
    "extra", "lots", "little", "but", "or", "only", "also", "easy", "quick",
];

/// Words after "no" that start a comparison rather than name an exclusion
const EXCLUSION_STOP: &[&str] = &[
    "more", "less", "longer", "later", "than", "over", "under", "fuss", "bake",
];

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:(over|more than|at least|longer than|under|less than|within|in|up to|no more than|max)\s+)?(\d{1,3})\s*-?\s*(minutes?|mins?|hours?|hrs?)\b",
        )
        .expect("time pattern is valid")
    })
}

/// Regex and vocabulary rules, used when no LLM is configured
#[derive(Debug, Clone, Default)]
pub struct KeywordFilterExtractor;

impl KeywordFilterExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_times(query: &str, filters: &mut Filters) {
        for caps in time_pattern().captures_iter(query) {
            let Ok(amount) = caps[2].parse::<u32>() else {
                continue;
            };
            let unit = caps[3].to_lowercase();
            let minutes = if unit.starts_with('h') {
                amount.saturating_mul(60)
            } else {
                amount
            };

            let lower_bound = caps.get(1).is_some_and(|m| {
                matches!(
                    m.as_str().to_lowercase().as_str(),
                    "over" | "more than" | "at least" | "longer than"
                )
            });
            if lower_bound {
                filters.min_time.get_or_insert(minutes);
            } else {
                filters.max_time.get_or_insert(minutes);
            }
        }
    }

    fn extract_ingredients(tokens: &[String]) -> TagSet {
        let mut ingredients = TagSet::new();
        for (i, token) in tokens.iter().enumerate() {
            if !matches!(token.as_str(), "with" | "using" | "containing") {
                continue;
            }
            for next in tokens.iter().skip(i + 1) {
                if next == "and" {
                    continue;
                }
                let stop = INGREDIENT_STOP.contains(&next.as_str())
                    || vocabulary::FILLER_WORDS.contains(&next.as_str())
                    || vocabulary::VAGUE_TERMS.contains(&next.as_str())
                    || next.chars().all(|c| c.is_ascii_digit());
                if stop || ingredients.len() >= 3 {
                    break;
                }
                // Proteins become main_protein instead
                if vocabulary::PROTEINS.iter().any(|p| contains_term(std::slice::from_ref(next), p)) {
                    continue;
                }
                ingredients.insert(next);
            }
        }
        ingredients
    }

    fn extract_exclusions(tokens: &[String]) -> TagSet {
        tokens
            .windows(2)
            .filter(|w| matches!(w[0].as_str(), "without" | "no"))
            .map(|w| w[1].as_str())
            .filter(|w| !vocabulary::FILLER_WORDS.contains(w))
            // "no more than 30 minutes" is a time bound
            .filter(|w| !EXCLUSION_STOP.contains(w))
            .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
            .collect()
    }
}

impl FilterExtractor for KeywordFilterExtractor {
    fn extract(&self, query: &str) -> Result<Filters> {
        let tokens = vocabulary::words(query);
        let mut filters = Filters::new();

        Self::extract_times(query, &mut filters);
        let quick = ["quick", "fast", "speedy"]
            .iter()
            .any(|t| contains_term(&tokens, t));
        if quick && filters.max_time.is_none() {
            filters.max_time = Some(QUICK_MAX_MINUTES);
        }

        filters.difficulty = if ["easy", "simple", "beginner"]
            .iter()
            .any(|t| contains_term(&tokens, t))
        {
            Some("easy".to_string())
        } else if contains_term(&tokens, "medium") {
            Some("medium".to_string())
        } else if ["hard", "difficult", "challenging", "advanced"]
            .iter()
            .any(|t| contains_term(&tokens, t))
        {
            Some("hard".to_string())
        } else {
            None
        };

        filters.result_limit = requested_count(query);

        // "no chicken" / "without pork" are exclusions, not requests
        let excluded = Self::extract_exclusions(&tokens);
        filters.main_protein = vocabulary::PROTEINS
            .iter()
            .find(|p| contains_term(&tokens, p) && !excluded.contains(p))
            .map(|p| p.to_string());
        filters.exclude_tags = excluded;

        for (phrase, tag) in DIETARY_PHRASES {
            if contains_phrase(&tokens, phrase) || contains_term(&tokens, phrase) {
                filters.dietary_tags.insert(tag);
            }
        }

        for cuisine in vocabulary::CUISINES {
            if contains_term(&tokens, cuisine) {
                filters.cuisine.insert(cuisine);
            }
        }

        for (phrase, tag) in CATEGORY_TERMS {
            if contains_phrase(&tokens, phrase) || contains_term(&tokens, phrase) {
                filters.tags.insert(tag);
            }
        }

        filters.recipe_name = DISH_TYPES
            .iter()
            .find(|d| contains_term(&tokens, d))
            .map(|d| d.to_string());

        let generic = GENERIC_MEAL_TERMS.iter().any(|t| contains_term(&tokens, t))
            || !filters.dietary_tags.is_empty();
        if filters.tags.is_empty() && filters.recipe_name.is_none() && generic {
            for tag in DEFAULT_MEAL_TAGS {
                filters.tags.insert(tag);
            }
        }

        let dessert = DESSERT_TERMS.iter().any(|t| contains_term(&tokens, t));
        let protein_rich = contains_phrase(&tokens, "high protein")
            || contains_phrase(&tokens, "protein rich")
            || contains_phrase(&tokens, "lots of protein");
        if protein_rich && !dessert {
            filters.high_protein = Some(true);
        }
        if (contains_phrase(&tokens, "low fat") || contains_phrase(&tokens, "reduced fat"))
            && !dessert
        {
            filters.low_fat = Some(true);
        }
        if contains_phrase(&tokens, "low carb") || contains_term(&tokens, "keto") {
            filters.low_carb = Some(true);
        }
        if contains_phrase(&tokens, "low calorie")
            || contains_phrase(&tokens, "low cal")
            || contains_term(&tokens, "light")
        {
            filters.low_calorie = Some(true);
        }

        if RATING_PHRASES.iter().any(|p| contains_phrase(&tokens, p)) {
            filters.min_rating = Some(GOOD_RATING);
        }

        filters.ingredients = Self::extract_ingredients(&tokens);

        tracing::debug!("Keyword extraction for '{}': {}", query, filters.to_json());
        Ok(filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(query: &str) -> Filters {
        KeywordFilterExtractor::new().extract(query).unwrap()
    }

    #[test]
    fn test_easy_vegetarian_dinner() {
        let filters = extract("easy vegetarian dinner under 30 minutes");
        assert!(filters.dietary_tags.contains("vegetarian"));
        assert_eq!(filters.max_time, Some(30));
        assert_eq!(filters.difficulty.as_deref(), Some("easy"));
        assert_eq!(filters.tags.to_vec(), vec!["mains", "salads", "soups"]);
    }

    #[test]
    fn test_dish_type_skips_default_categories() {
        let filters = extract("chicken curry");
        assert_eq!(filters.main_protein.as_deref(), Some("chicken"));
        assert_eq!(filters.recipe_name.as_deref(), Some("curry"));
        assert!(filters.tags.is_empty());
    }

    #[test]
    fn test_dessert_never_high_protein() {
        let filters = extract("high protein low fat chocolate dessert");
        assert_eq!(filters.high_protein, None);
        assert_eq!(filters.low_fat, None);
        assert!(filters.tags.contains("desserts"));

        let filters = extract("high protein low fat lunch");
        assert_eq!(filters.high_protein, Some(true));
        assert_eq!(filters.low_fat, Some(true));
    }

    #[test]
    fn test_count_and_explicit_category() {
        let filters = extract("5 easy breakfast recipes");
        assert_eq!(filters.result_limit, Some(5));
        assert_eq!(filters.tags.to_vec(), vec!["breakfast"]);
    }

    #[test]
    fn test_time_bounds() {
        let filters = extract("slow cooked beef stew over 2 hours");
        assert_eq!(filters.min_time, Some(120));
        assert_eq!(filters.max_time, None);
        assert_eq!(filters.main_protein.as_deref(), Some("beef"));

        assert_eq!(extract("quick pasta").max_time, Some(30));
        assert_eq!(extract("quick 15 minute pasta").max_time, Some(15));
    }

    #[test]
    fn test_rating_request() {
        let filters = extract("Give me some recipes with good rating");
        assert_eq!(filters.min_rating, Some(4.0));
        assert!(filters.ingredients.is_empty());
    }

    #[test]
    fn test_ingredients_after_with() {
        let filters = extract("soup with lentils and carrots");
        assert!(filters.tags.contains("soups"));
        assert_eq!(filters.ingredients.to_vec(), vec!["carrots", "lentils"]);
    }

    #[test]
    fn test_exclusions() {
        let filters = extract("stir fry without pork");
        assert!(filters.exclude_tags.contains("pork"));
        assert_eq!(filters.main_protein, None);
    }

    #[test]
    fn test_time_comparison_is_not_an_exclusion() {
        let mut filters = extract("chicken dinner no more than 30 minutes");
        assert_eq!(filters.max_time, Some(30));
        assert!(filters.exclude_tags.is_empty());

        filters.apply_protein_exclusions();
        assert!(filters.exclude_tags.contains("beef"));
        assert!(filters.exclude_tags.contains("fish"));
        assert!(!filters.exclude_tags.contains("more"));

        assert!(extract("no less than 20 minutes").exclude_tags.is_empty());
    }

    #[test]
    fn test_ingredient_exclusion_keeps_protein_exclusions() {
        let mut filters = extract("chicken without mushrooms");
        assert!(filters.exclude_tags.contains("mushrooms"));

        filters.apply_protein_exclusions();
        assert!(filters.exclude_tags.contains("mushrooms"));
        assert!(filters.exclude_tags.contains("pork"));
        assert!(!filters.exclude_tags.contains("chicken"));
    }

    #[test]
    fn test_cuisine_and_dietary_phrases() {
        let filters = extract("gluten-free thai dishes");
        assert!(filters.dietary_tags.contains("gluten-free"));
        assert!(filters.cuisine.contains("thai"));
    }

    #[test]
    fn test_nothing_recognized() {
        assert!(extract("surprise me").is_empty());
    }
}
