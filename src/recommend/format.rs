//! Plain-text rendering of ranked recipes for the chat transcript

use crate::ranking::RankedRecipe;

const RULE_WIDTH: usize = 60;

/// One recipe block, numbered from 1
pub fn format_recipe(position: usize, ranked: &RankedRecipe) -> String {
    let recipe = &ranked.recipe;
    let rule = "=".repeat(RULE_WIDTH);

    let mut out = format!("{}\n#{} {}\n", rule, position, recipe.title);
    out.push_str(&format!("URL: {}\n", recipe.url));

    if let Some(image) = &recipe.image_url {
        out.push_str(&format!("Image: {}\n", image));
    }

    match recipe.rating {
        Some(rating) if recipe.rating_count > 0 => out.push_str(&format!(
            "Rating: {:.1}/5.0 ({} reviews)\n",
            rating, recipe.rating_count
        )),
        _ => out.push_str("Rating: not yet rated\n"),
    }

    if let Some(total) = recipe.total_time_minutes {
        out.push_str(&format!("Time: {} minutes\n", total));
    }

    out.push_str(&format!(
        "Difficulty: {}\n",
        recipe.difficulty.as_deref().unwrap_or("unknown")
    ));
    out.push_str(&format!("Relevance Score: {:.3}\n", ranked.score));
    out.push_str(&rule);
    out.push('\n');
    out
}

/// All recipes of a turn, or a hint when there are none
pub fn format_results(recipes: &[RankedRecipe]) -> String {
    if recipes.is_empty() {
        return "No recipes matched. Try loosening a constraint, e.g. allow more time or drop a dietary filter.\n"
            .to_string();
    }

    let mut out = format!(
        "Found {} recipe{}:\n",
        recipes.len(),
        if recipes.len() == 1 { "" } else { "s" }
    );
    for (i, recipe) in recipes.iter().enumerate() {
        out.push_str(&format_recipe(i + 1, recipe));
    }
    out
}
