//! SQLite-backed recipe retriever

use super::database::Database;
use super::query::{build_search_query, RECIPE_COLUMNS};
use crate::config::Config;
use crate::embedding::{cosine_similarity, decode_vector, encode_vector};
use crate::error::{MiseError, Result};
use crate::filters::Filters;
use crate::retrieval::{with_backoff, Candidate, Retriever, RetryPolicy};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A full recipe row as written to the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeRecord {
    pub recipe_id: String,
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
    pub prep_time_minutes: Option<u32>,
    pub cook_time_minutes: Option<u32>,
    pub total_time_minutes: Option<u32>,
    pub servings: Option<u32>,
    pub difficulty: Option<String>,
    pub calories_kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub rating: Option<f64>,
    pub rating_count: u64,
    /// Meal categories, cuisines and main ingredients
    pub tags: Vec<String>,
    pub dietary_tags: Vec<String>,
    pub ingredients: Vec<String>,
    /// Device revisions the recipe supports
    pub devices: Vec<String>,
    pub embedding: Option<Vec<f32>>,
}

impl RecipeRecord {
    pub fn new(recipe_id: impl Into<String>, title: impl Into<String>) -> Self {
        let recipe_id = recipe_id.into();
        Self {
            url: format!("https://cookidoo.international/recipes/recipe/en/{}", recipe_id),
            recipe_id,
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Recipe catalogue with the two-stage filtered similarity search
pub struct RecipeStore {
    db: Database,
    device_version: String,
    retry: RetryPolicy,
}

impl RecipeStore {
    pub fn new(db: Database, device_version: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            db,
            device_version: device_version.into(),
            retry,
        }
    }

    /// Open the database named in `config`, retrying transient failures
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.database_path()?;
        let retry = RetryPolicy::with_retries(
            config.retrieval.max_retries,
            config.retrieval.initial_backoff_ms,
        );
        let db = Self::open_database(&path, config, retry)?;
        Ok(Self::new(db, config.storage.device_version.clone(), retry))
    }

    fn open_database(path: &Path, config: &Config, retry: RetryPolicy) -> Result<Database> {
        with_backoff(retry, "database open", || {
            Database::new(
                path,
                config.storage.pool_size,
                config.storage.busy_timeout_ms,
            )
        })
        .map_err(|(e, attempts)| MiseError::RetrieverUnavailable {
            attempts,
            message: e.to_string(),
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Insert or replace a recipe and its side-table rows
    pub fn upsert_recipe(&self, record: &RecipeRecord) -> Result<()> {
        let mut conn = self.db.get_conn()?;
        let tx = conn.transaction()?;

        let embedding = record.embedding.as_deref().map(encode_vector);

        tx.execute(
            "INSERT OR REPLACE INTO recipes (
                recipe_id, title, url, image_url,
                prep_time_minutes, cook_time_minutes, total_time_minutes, servings,
                difficulty, nutrition_calories_kcal, nutrition_protein_g,
                nutrition_carbs_g, nutrition_fat_g, rating, rating_count, embedding
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                record.recipe_id,
                record.title,
                record.url,
                record.image_url,
                record.prep_time_minutes,
                record.cook_time_minutes,
                record.total_time_minutes,
                record.servings,
                record.difficulty,
                record.calories_kcal,
                record.protein_g,
                record.carbs_g,
                record.fat_g,
                record.rating,
                record.rating_count as i64,
                embedding,
            ],
        )?;

        for table in [
            "recipe_tags",
            "recipe_dietary_tags",
            "recipe_ingredients",
            "recipe_devices",
        ] {
            tx.execute(
                &format!("DELETE FROM {} WHERE recipe_id = ?1", table),
                params![record.recipe_id],
            )?;
        }

        // Tags are matched case-insensitively; devices and ingredients keep their text
        let side_rows: [(&str, &[String], bool); 4] = [
            (
                "INSERT OR IGNORE INTO recipe_tags (recipe_id, tag) VALUES (?1, ?2)",
                record.tags.as_slice(),
                true,
            ),
            (
                "INSERT OR IGNORE INTO recipe_dietary_tags (recipe_id, dietary_tag) VALUES (?1, ?2)",
                record.dietary_tags.as_slice(),
                true,
            ),
            (
                "INSERT INTO recipe_ingredients (recipe_id, ingredient) VALUES (?1, ?2)",
                record.ingredients.as_slice(),
                false,
            ),
            (
                "INSERT OR IGNORE INTO recipe_devices (recipe_id, version) VALUES (?1, ?2)",
                record.devices.as_slice(),
                false,
            ),
        ];
        for (sql, values, lowercase) in side_rows {
            let mut stmt = tx.prepare(sql)?;
            for value in values {
                let value = value.trim();
                let value = if lowercase {
                    value.to_lowercase()
                } else {
                    value.to_string()
                };
                stmt.execute(params![record.recipe_id, value])?;
            }
        }

        tx.commit()?;
        tracing::debug!("Stored recipe {} ({})", record.recipe_id, record.title);
        Ok(())
    }

    fn search_once(
        &self,
        filters: &Filters,
        query_embedding: &[f32],
        name_pattern: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        let query = build_search_query(filters, &self.device_version, name_pattern);
        tracing::debug!("Recipe search SQL: {}", query.sql);

        let conn = self.db.get_conn()?;
        let mut stmt = conn.prepare(&query.sql)?;
        let rows = stmt.query_map(params_from_iter(query.params.iter()), |row| {
            let candidate = candidate_from_row(row)?;
            let blob: Vec<u8> = row.get(15)?;
            Ok((candidate, blob))
        })?;

        let mut candidates = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            let (mut candidate, blob) = row?;
            match decode_vector(&blob) {
                Some(vector) if vector.len() == query_embedding.len() => {
                    let similarity = cosine_similarity(query_embedding, &vector) as f64;
                    candidate.similarity = similarity.clamp(0.0, 1.0);
                    candidates.push(candidate);
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} recipes with unusable embeddings", skipped);
        }

        candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        candidates.truncate(limit);

        tracing::info!(
            "Recipe search returned {} candidates (filters: {})",
            candidates.len(),
            filters.to_json()
        );
        Ok(candidates)
    }

    fn recipe_once(&self, recipe_id: &str) -> Result<Option<Candidate>> {
        let conn = self.db.get_conn()?;
        let candidate = conn
            .query_row(
                &format!("SELECT {} FROM recipes r WHERE r.recipe_id = ?1", RECIPE_COLUMNS),
                params![recipe_id],
                candidate_from_row,
            )
            .optional()?;
        Ok(candidate)
    }

    fn with_retry<T>(&self, what: &str, op: impl FnMut() -> Result<T>) -> Result<T> {
        with_backoff(self.retry, what, op).map_err(|(e, attempts)| {
            tracing::error!("{} failed after {} attempts: {}", what, attempts, e);
            MiseError::RetrieverUnavailable {
                attempts,
                message: e.to_string(),
            }
        })
    }
}

impl Retriever for RecipeStore {
    fn search(
        &self,
        filters: &Filters,
        query_embedding: &[f32],
        name_pattern: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        self.with_retry("recipe search", || {
            self.search_once(filters, query_embedding, name_pattern, limit)
        })
    }

    fn recipe(&self, recipe_id: &str) -> Result<Option<Candidate>> {
        self.with_retry("recipe lookup", || self.recipe_once(recipe_id))
    }

    fn embedding_dimension(&self) -> Result<Option<usize>> {
        let conn = self.db.get_conn()?;
        let bytes: Option<i64> = conn
            .query_row(
                "SELECT length(embedding) FROM recipes WHERE embedding IS NOT NULL LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(bytes.map(|b| b as usize / 4))
    }
}

fn candidate_from_row(row: &Row<'_>) -> rusqlite::Result<Candidate> {
    let rating_count: Option<i64> = row.get(14)?;
    Ok(Candidate {
        recipe_id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        image_url: row.get(3)?,
        prep_time_minutes: row.get(4)?,
        cook_time_minutes: row.get(5)?,
        total_time_minutes: row.get(6)?,
        servings: row.get(7)?,
        difficulty: row.get(8)?,
        calories_kcal: row.get(9)?,
        protein_g: row.get(10)?,
        carbs_g: row.get(11)?,
        fat_g: row.get(12)?,
        rating: row.get(13)?,
        rating_count: rating_count.unwrap_or(0).max(0) as u64,
        similarity: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(temp_dir: &TempDir) -> RecipeStore {
        let db = Database::new(&temp_dir.path().join("recipes.sqlite"), 2, 1000).unwrap();
        RecipeStore::new(db, "TM6", RetryPolicy::new(2, 0))
    }

    fn record(id: &str, title: &str, embedding: Vec<f32>) -> RecipeRecord {
        RecipeRecord {
            devices: vec!["TM6".to_string()],
            embedding: Some(embedding),
            ..RecipeRecord::new(id, title)
        }
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store.upsert_recipe(&record("near", "Near", vec![1.0, 0.1])).unwrap();
        store.upsert_recipe(&record("far", "Far", vec![0.2, 1.0])).unwrap();
        store.upsert_recipe(&record("opposite", "Opposite", vec![-1.0, 0.0])).unwrap();

        let results = store.search(&Filters::new(), &[1.0, 0.0], None, 10).unwrap();
        let ids: Vec<&str> = results.iter().map(|c| c.recipe_id.as_str()).collect();

        assert_eq!(ids, vec!["near", "far", "opposite"]);
        assert_eq!(results[2].similarity, 0.0);
        assert!(results.iter().all(|c| (0.0..=1.0).contains(&c.similarity)));
    }

    #[test]
    fn test_device_compatibility_required() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store.upsert_recipe(&record("tm6", "Soup", vec![1.0, 0.0])).unwrap();
        let tm5_only = RecipeRecord {
            devices: vec!["TM5".to_string()],
            ..record("tm5", "Old soup", vec![1.0, 0.0])
        };
        store.upsert_recipe(&tm5_only).unwrap();

        let results = store.search(&Filters::new(), &[1.0, 0.0], None, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].recipe_id, "tm6");
    }

    #[test]
    fn test_filters_restrict_rows() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let quick_vegan = RecipeRecord {
            total_time_minutes: Some(20),
            dietary_tags: vec!["Vegan".to_string()],
            tags: vec!["mains".to_string()],
            ..record("a", "Lentil Dal", vec![1.0, 0.0])
        };
        let slow_vegan = RecipeRecord {
            total_time_minutes: Some(90),
            dietary_tags: vec!["vegan".to_string()],
            ..record("b", "Vegan Stew", vec![1.0, 0.0])
        };
        let quick_beef = RecipeRecord {
            total_time_minutes: Some(15),
            tags: vec!["beef".to_string()],
            ..record("c", "Beef Stir Fry", vec![1.0, 0.0])
        };
        for r in [&quick_vegan, &slow_vegan, &quick_beef] {
            store.upsert_recipe(r).unwrap();
        }

        let filters = Filters {
            max_time: Some(30),
            dietary_tags: ["vegan"].into_iter().collect(),
            ..Default::default()
        };
        let results = store.search(&filters, &[1.0, 0.0], None, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].recipe_id, "a");

        let filters = Filters {
            exclude_tags: ["beef"].into_iter().collect(),
            ..Default::default()
        };
        let results = store.search(&filters, &[1.0, 0.0], None, 10).unwrap();
        assert!(results.iter().all(|c| c.recipe_id != "c"));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_name_pattern_and_nutrition() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let lean = RecipeRecord {
            protein_g: Some(32.0),
            fat_g: Some(6.0),
            ..record("lean", "Chicken Curry", vec![1.0, 0.0])
        };
        let rich = RecipeRecord {
            protein_g: Some(12.0),
            fat_g: Some(25.0),
            ..record("rich", "Butter Curry", vec![1.0, 0.0])
        };
        store.upsert_recipe(&lean).unwrap();
        store.upsert_recipe(&rich).unwrap();

        let curries = store.search(&Filters::new(), &[1.0, 0.0], Some("curry"), 10).unwrap();
        assert_eq!(curries.len(), 2);

        let filters = Filters {
            high_protein: Some(true),
            low_fat: Some(true),
            ..Default::default()
        };
        let results = store.search(&filters, &[1.0, 0.0], None, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].recipe_id, "lean");
    }

    #[test]
    fn test_main_protein_matches_title_or_tag() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store.upsert_recipe(&record("t", "Roast Chicken", vec![1.0, 0.0])).unwrap();
        let tagged = RecipeRecord {
            tags: vec!["chicken".to_string()],
            ..record("g", "Sunday Roast", vec![1.0, 0.0])
        };
        store.upsert_recipe(&tagged).unwrap();
        store.upsert_recipe(&record("x", "Tomato Soup", vec![1.0, 0.0])).unwrap();

        let filters = Filters {
            main_protein: Some("chicken".to_string()),
            ..Default::default()
        };
        let results = store.search(&filters, &[1.0, 0.0], None, 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|c| c.recipe_id != "x"));
    }

    #[test]
    fn test_search_truncates_to_limit() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        for i in 0..5 {
            store
                .upsert_recipe(&record(&format!("r{}", i), "Dish", vec![1.0, i as f32]))
                .unwrap();
        }

        assert_eq!(store.search(&Filters::new(), &[1.0, 0.0], None, 3).unwrap().len(), 3);
    }

    #[test]
    fn test_recipe_lookup_and_dimension() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        assert_eq!(store.embedding_dimension().unwrap(), None);

        let rated = RecipeRecord {
            rating: Some(4.5),
            rating_count: 120,
            ..record("abc", "Pancakes", vec![0.1, 0.2, 0.3])
        };
        store.upsert_recipe(&rated).unwrap();

        let found = store.recipe("abc").unwrap().unwrap();
        assert_eq!(found.title, "Pancakes");
        assert_eq!(found.rating, Some(4.5));
        assert_eq!(found.rating_count, 120);
        assert!(store.recipe("missing").unwrap().is_none());
        assert_eq!(store.embedding_dimension().unwrap(), Some(3));
    }

    #[test]
    fn test_upsert_replaces_side_rows() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let first = RecipeRecord {
            tags: vec!["soups".to_string()],
            ..record("s", "Soup", vec![1.0, 0.0])
        };
        store.upsert_recipe(&first).unwrap();
        let second = RecipeRecord {
            tags: vec!["mains".to_string()],
            ..first.clone()
        };
        store.upsert_recipe(&second).unwrap();

        let soups = Filters {
            tags: ["soups"].into_iter().collect(),
            ..Default::default()
        };
        assert!(store.search(&soups, &[1.0, 0.0], None, 10).unwrap().is_empty());
    }
}
