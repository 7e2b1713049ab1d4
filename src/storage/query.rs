//! SQL stage of the hybrid search
//!
//! Translates a `Filters` value into a WHERE clause with bound parameters.
//! Values never appear in the SQL text.

use crate::filters::Filters;
use rusqlite::types::Value;

/// Protein above this many grams per serving counts as high protein
pub const HIGH_PROTEIN_MIN_G: f64 = 20.0;
/// Fat below this many grams per serving counts as low fat
pub const LOW_FAT_MAX_G: f64 = 10.0;
/// Carbohydrates below this many grams per serving count as low carb
pub const LOW_CARB_MAX_G: f64 = 30.0;
/// Energy below this many kcal per serving counts as low calorie
pub const LOW_CALORIE_MAX_KCAL: f64 = 300.0;

pub(crate) const RECIPE_COLUMNS: &str = "r.recipe_id, r.title, r.url, r.image_url, \
     r.prep_time_minutes, r.cook_time_minutes, r.total_time_minutes, r.servings, \
     r.difficulty, r.nutrition_calories_kcal, r.nutrition_protein_g, \
     r.nutrition_carbs_g, r.nutrition_fat_g, r.rating, r.rating_count";

/// A SELECT statement and its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Accumulates AND-ed conditions
#[derive(Debug, Default)]
struct WhereBuilder {
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl WhereBuilder {
    fn push(&mut self, condition: impl Into<String>, params: impl IntoIterator<Item = Value>) {
        self.conditions.push(condition.into());
        self.params.extend(params);
    }

    fn placeholders(count: usize) -> String {
        vec!["?"; count].join(", ")
    }

    fn text_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<Value> {
        values.map(|v| Value::Text(v.to_string())).collect()
    }

    fn clause(&self) -> String {
        self.conditions.join("\n  AND ")
    }
}

/// `%value%` with LIKE wildcards in `value` escaped
fn like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Build the candidate query: device-compatible, embedded recipes matching
/// every present filter key
pub fn build_search_query(
    filters: &Filters,
    device_version: &str,
    name_pattern: Option<&str>,
) -> SqlQuery {
    let mut w = WhereBuilder::default();

    w.push("r.embedding IS NOT NULL", []);
    w.push(
        "EXISTS (SELECT 1 FROM recipe_devices d WHERE d.recipe_id = r.recipe_id AND d.version = ?)",
        [Value::Text(device_version.to_string())],
    );

    if !filters.tags.is_empty() {
        w.push(
            format!(
                "r.recipe_id IN (SELECT recipe_id FROM recipe_tags WHERE lower(tag) IN ({}))",
                WhereBuilder::placeholders(filters.tags.len())
            ),
            WhereBuilder::text_values(filters.tags.iter()),
        );
    }

    if !filters.cuisine.is_empty() {
        w.push(
            format!(
                "r.recipe_id IN (SELECT recipe_id FROM recipe_tags WHERE lower(tag) IN ({}))",
                WhereBuilder::placeholders(filters.cuisine.len())
            ),
            WhereBuilder::text_values(filters.cuisine.iter()),
        );
    }

    if !filters.dietary_tags.is_empty() {
        w.push(
            format!(
                "r.recipe_id IN (SELECT recipe_id FROM recipe_dietary_tags WHERE lower(dietary_tag) IN ({}))",
                WhereBuilder::placeholders(filters.dietary_tags.len())
            ),
            WhereBuilder::text_values(filters.dietary_tags.iter()),
        );
    }

    if !filters.exclude_tags.is_empty() {
        w.push(
            format!(
                "r.recipe_id NOT IN (SELECT recipe_id FROM recipe_tags WHERE lower(tag) IN ({}))",
                WhereBuilder::placeholders(filters.exclude_tags.len())
            ),
            WhereBuilder::text_values(filters.exclude_tags.iter()),
        );
    }

    if let Some(protein) = filters.main_protein.as_deref() {
        w.push(
            "(r.title LIKE ? ESCAPE '\\' OR r.recipe_id IN (SELECT recipe_id FROM recipe_tags WHERE lower(tag) = ?))",
            [
                Value::Text(like_pattern(protein)),
                Value::Text(protein.to_string()),
            ],
        );
    }

    if let Some(max) = filters.max_time {
        w.push("r.total_time_minutes <= ?", [Value::Integer(max as i64)]);
    }
    if let Some(min) = filters.min_time {
        w.push("r.total_time_minutes >= ?", [Value::Integer(min as i64)]);
    }

    if let Some(difficulty) = filters.difficulty.as_deref() {
        w.push(
            "lower(r.difficulty) = ?",
            [Value::Text(difficulty.to_lowercase())],
        );
    }

    if let Some(rating) = filters.min_rating {
        w.push("r.rating >= ?", [Value::Real(rating)]);
    }

    if let Some(name) = name_pattern {
        w.push("r.title LIKE ? ESCAPE '\\'", [Value::Text(like_pattern(name))]);
    }

    // Each ingredient must appear
    for ingredient in filters.ingredients.iter() {
        w.push(
            "r.recipe_id IN (SELECT recipe_id FROM recipe_ingredients WHERE ingredient LIKE ? ESCAPE '\\')",
            [Value::Text(like_pattern(ingredient))],
        );
    }

    if filters.high_protein == Some(true) {
        w.push("r.nutrition_protein_g > ?", [Value::Real(HIGH_PROTEIN_MIN_G)]);
    }
    if filters.low_fat == Some(true) {
        w.push("r.nutrition_fat_g < ?", [Value::Real(LOW_FAT_MAX_G)]);
    }
    if filters.low_carb == Some(true) {
        w.push("r.nutrition_carbs_g < ?", [Value::Real(LOW_CARB_MAX_G)]);
    }
    if filters.low_calorie == Some(true) {
        w.push(
            "r.nutrition_calories_kcal < ?",
            [Value::Real(LOW_CALORIE_MAX_KCAL)],
        );
    }

    SqlQuery {
        sql: format!(
            "SELECT {}, r.embedding\nFROM recipes r\nWHERE {}",
            RECIPE_COLUMNS,
            w.clause()
        ),
        params: w.params,
    }
}
