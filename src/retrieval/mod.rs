//! Hybrid retrieval interface
//!
//! A retriever runs the two-stage search: SQL filtering on structured
//! attributes, then vector-similarity ordering of the surviving rows.
//! Results are restricted to device-compatible recipes.

mod retry;

pub use retry::{with_backoff, RetryPolicy};

use crate::error::Result;
use crate::filters::Filters;
use serde::{Deserialize, Serialize};

/// A recipe row returned by the retriever, scored against the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub recipe_id: String,
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
    /// Average rating on a 0-5 scale, absent when never rated
    pub rating: Option<f64>,
    pub rating_count: u64,
    /// Cosine similarity to the query embedding, clamped to 0-1
    pub similarity: f64,
    pub prep_time_minutes: Option<u32>,
    pub cook_time_minutes: Option<u32>,
    pub total_time_minutes: Option<u32>,
    pub servings: Option<u32>,
    pub difficulty: Option<String>,
    pub calories_kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

impl Candidate {
    /// Minimal candidate, mostly useful for tests and fixtures
    pub fn new(recipe_id: impl Into<String>, title: impl Into<String>) -> Self {
        let recipe_id = recipe_id.into();
        Self {
            url: format!("https://cookidoo.international/recipes/recipe/en/{}", recipe_id),
            recipe_id,
            title: title.into(),
            image_url: None,
            rating: None,
            rating_count: 0,
            similarity: 0.0,
            prep_time_minutes: None,
            cook_time_minutes: None,
            total_time_minutes: None,
            servings: None,
            difficulty: None,
            calories_kcal: None,
            protein_g: None,
            carbs_g: None,
            fat_g: None,
        }
    }

    pub fn with_rating(mut self, rating: f64, rating_count: u64) -> Self {
        self.rating = Some(rating);
        self.rating_count = rating_count;
        self
    }

    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = similarity;
        self
    }
}

/// Source of candidate recipes
pub trait Retriever {
    /// Run the filtered similarity search and return at most `limit`
    /// candidates ordered by similarity
    fn search(
        &self,
        filters: &Filters,
        query_embedding: &[f32],
        name_pattern: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Candidate>>;

    /// Look up one recipe by identifier
    fn recipe(&self, recipe_id: &str) -> Result<Option<Candidate>>;

    /// Dimension of the stored vectors, `None` when nothing is embedded yet
    fn embedding_dimension(&self) -> Result<Option<usize>>;
}
