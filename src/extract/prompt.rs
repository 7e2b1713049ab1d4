/// Instructions for the extraction model
const RULES: &str = r#"You turn recipe search requests into a JSON filter object.

Keys (omit any key the request does not mention):
- dietary_tags: list, e.g. vegetarian, vegan, gluten-free, nut-free, lactose-free, sugar-free
- tags: list of meal categories: breakfast, desserts, soups, salads, mains, side dishes, drinks
- cuisine: list, e.g. indian, italian, chinese, mexican, thai, french, japanese, greek
- max_time / min_time: total minutes ("quick" means max_time 30)
- difficulty: easy, medium or hard
- recipe_name: dish keywords to match in the title
- main_protein: chicken, beef, pork, lamb, fish, seafood, turkey or duck
- exclude_tags: tags that must not appear
- high_protein, low_fat, low_carb, low_calorie: true when requested
- min_rating: number 0-5 when the user wants well rated recipes
- ingredients: list of ingredients that must be used
- result_limit: how many recipes the user asked for

Rules:
1. Desserts, cakes, sweets and pastries never get high_protein or low_fat.
2. Nutrition requests (protein, low fat) exclude dessert categories.
3. A generic request for "recipes", "lunch" or "dinner" without a category means tags ["mains", "soups", "salads"].
4. Only use desserts, drinks, side dishes or breakfast when the request names them.
5. Vegetarian or vegan requests without a category also use ["mains", "soups", "salads"].
6. When a main protein is named, exclude the other proteins, e.g. chicken -> exclude_tags ["beef", "pork", "lamb", "fish"].
7. main_protein must match the title or tags, never just an ingredient such as chicken stock.
8. Dish types (pasta, rice, pizza, curry) go in recipe_name without default category tags.

Reply with the JSON object only."#;

const EXAMPLES: &[(&str, &str)] = &[
    (
        "easy vegetarian dinner under 30 minutes",
        r#"{"dietary_tags": ["vegetarian"], "tags": ["mains", "soups", "salads"], "max_time": 30, "difficulty": "easy"}"#,
    ),
    (
        "quick vegetarian recipes, high protein and low fat",
        r#"{"dietary_tags": ["vegetarian"], "tags": ["mains", "soups", "salads"], "max_time": 30, "high_protein": true, "low_fat": true}"#,
    ),
    (
        "gluten free nut free desserts",
        r#"{"dietary_tags": ["gluten-free", "nut-free"], "tags": ["desserts"]}"#,
    ),
    (
        "chicken curry",
        r#"{"recipe_name": "curry", "main_protein": "chicken", "exclude_tags": ["beef", "pork", "lamb", "fish"]}"#,
    ),
    ("pasta recipes", r#"{"recipe_name": "pasta"}"#),
    (
        "5 easy breakfast recipes",
        r#"{"tags": ["breakfast"], "difficulty": "easy", "result_limit": 5}"#,
    ),
    (
        "beef stew under 60 minutes",
        r#"{"tags": ["mains", "soups", "salads"], "main_protein": "beef", "exclude_tags": ["chicken", "pork", "lamb", "fish"], "max_time": 60}"#,
    ),
    (
        "easy italian pasta",
        r#"{"cuisine": ["italian"], "recipe_name": "pasta", "difficulty": "easy"}"#,
    ),
    (
        "top rated vegetarian thai meals",
        r#"{"dietary_tags": ["vegetarian"], "cuisine": ["thai"], "tags": ["mains", "soups", "salads"], "min_rating": 4.0}"#,
    ),
    (
        "soup with lentils and carrots",
        r#"{"tags": ["soups"], "ingredients": ["lentils", "carrots"]}"#,
    ),
];

/// Full prompt for one query
pub fn build_prompt(query: &str) -> String {
    let mut prompt = String::with_capacity(RULES.len() + 2048);
    prompt.push_str(RULES);
    prompt.push_str("\n\nExamples:\n");
    for (request, reply) in EXAMPLES {
        prompt.push_str(&format!("Request: \"{}\"\nJSON: {}\n\n", request, reply));
    }
    prompt.push_str(&format!("Request: \"{}\"\nJSON:", query.trim()));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::parse_filter_response;

    #[test]
    fn test_prompt_ends_with_query() {
        let prompt = build_prompt("  vegan tacos ");
        assert!(prompt.ends_with("Request: \"vegan tacos\"\nJSON:"));
    }

    #[test]
    fn test_examples_parse_as_filters() {
        for (request, reply) in EXAMPLES {
            assert!(
                parse_filter_response(reply).is_ok(),
                "example for '{}' should parse",
                request
            );
        }
    }
}
