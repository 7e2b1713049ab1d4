//! Shared fixtures: a deterministic embedder, stub stages and a temporary
//! recipe store

#![allow(dead_code)]

use mise::config::Config;
use mise::embedding::{EmbeddingError, EmbeddingProvider};
use mise::error::{MiseError, Result};
use mise::extract::{FilterExtractor, KeywordFilterExtractor};
use mise::filters::Filters;
use mise::recommend::Recommender;
use mise::retrieval::{Candidate, Retriever, RetryPolicy};
use mise::storage::{Database, RecipeRecord, RecipeStore};
use std::cell::Cell;
use std::rc::Rc;
use tempfile::TempDir;

/// Axes of the bag-of-words embedding; one extra bias axis keeps vectors non-zero
const AXES: &[&str] = &[
    "chicken", "beef", "vegetarian", "vegetable", "thai", "curry", "soup", "pasta", "cake",
    "tomato",
];

/// Counts axis words in the text; similar texts get similar vectors
pub struct BagOfWordsEmbedder;

impl EmbeddingProvider for BagOfWordsEmbedder {
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut vector: Vec<f32> = AXES
            .iter()
            .map(|axis| {
                tokens
                    .iter()
                    .filter(|t| *t == axis || t.strip_suffix('s') == Some(*axis))
                    .count() as f32
            })
            .collect();
        vector.push(0.25);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        AXES.len() + 1
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }
}

/// Always fails, as an unreachable LLM would
pub struct FailingExtractor;

impl FilterExtractor for FailingExtractor {
    fn extract(&self, _query: &str) -> Result<Filters> {
        Err(MiseError::Extraction("LLM endpoint unreachable".to_string()))
    }
}

/// Returns a fixed candidate list, or fails while `fail` is set
pub struct FixedRetriever {
    pub candidates: Vec<Candidate>,
    pub fail: Rc<Cell<bool>>,
    pub calls: Rc<Cell<usize>>,
}

impl FixedRetriever {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            fail: Rc::new(Cell::new(false)),
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl Retriever for FixedRetriever {
    fn search(
        &self,
        _filters: &Filters,
        _query_embedding: &[f32],
        _name_pattern: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        self.calls.set(self.calls.get() + 1);
        if self.fail.get() {
            return Err(MiseError::RetrieverUnavailable {
                attempts: 3,
                message: "connection refused".to_string(),
            });
        }
        Ok(self.candidates.iter().take(limit).cloned().collect())
    }

    fn recipe(&self, recipe_id: &str) -> Result<Option<Candidate>> {
        Ok(self
            .candidates
            .iter()
            .find(|c| c.recipe_id == recipe_id)
            .cloned())
    }

    fn embedding_dimension(&self) -> Result<Option<usize>> {
        Ok(Some(BagOfWordsEmbedder.dimension()))
    }
}

/// Recipe fixture; the embedding is computed from title and tags
pub struct Fixture<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub tags: &'a [&'a str],
    pub dietary: &'a [&'a str],
    pub minutes: u32,
    pub rating: f64,
    pub rating_count: u64,
}

impl Fixture<'_> {
    pub fn record(&self) -> RecipeRecord {
        let text = format!("{} {}", self.title, self.tags.join(" "));
        RecipeRecord {
            total_time_minutes: Some(self.minutes),
            rating: Some(self.rating),
            rating_count: self.rating_count,
            difficulty: Some("easy".to_string()),
            tags: self.tags.iter().map(|s| s.to_string()).collect(),
            dietary_tags: self.dietary.iter().map(|s| s.to_string()).collect(),
            devices: vec!["TM6".to_string()],
            embedding: Some(BagOfWordsEmbedder.embed(&text).unwrap()),
            ..RecipeRecord::new(self.id, self.title)
        }
    }
}

/// Temporary SQLite store loaded with `fixtures`
pub fn store_with(temp: &TempDir, fixtures: &[Fixture<'_>]) -> RecipeStore {
    let db = Database::new(&temp.path().join("recipes.sqlite"), 2, 1000).unwrap();
    let store = RecipeStore::new(db, "TM6", RetryPolicy::new(2, 0));
    for fixture in fixtures {
        store.upsert_recipe(&fixture.record()).unwrap();
    }
    store
}

/// Keyword extraction, bag-of-words embedding and the given retriever
pub fn recommender(retriever: Box<dyn Retriever>) -> Recommender {
    Recommender::new(
        Box::new(KeywordFilterExtractor::new()),
        Box::new(BagOfWordsEmbedder),
        retriever,
        &Config::default(),
    )
}

pub fn chicken_fixtures() -> Vec<Fixture<'static>> {
    vec![
        Fixture {
            id: "c1",
            title: "Chicken Stir Fry",
            tags: &["mains", "chicken"],
            dietary: &[],
            minutes: 20,
            rating: 4.5,
            rating_count: 120,
        },
        Fixture {
            id: "c2",
            title: "Lemon Chicken Soup",
            tags: &["soups", "chicken"],
            dietary: &[],
            minutes: 25,
            rating: 4.2,
            rating_count: 40,
        },
        Fixture {
            id: "c3",
            title: "Roast Chicken",
            tags: &["mains", "chicken"],
            dietary: &[],
            minutes: 90,
            rating: 4.8,
            rating_count: 300,
        },
        Fixture {
            id: "b1",
            title: "Beef Stew",
            tags: &["mains", "beef"],
            dietary: &[],
            minutes: 120,
            rating: 4.6,
            rating_count: 210,
        },
        Fixture {
            id: "v1",
            title: "Tomato Soup",
            tags: &["soups"],
            dietary: &["vegetarian"],
            minutes: 30,
            rating: 4.0,
            rating_count: 15,
        },
    ]
}

pub fn vegetarian_fixtures() -> Vec<Fixture<'static>> {
    vec![
        Fixture {
            id: "t1",
            title: "Thai Vegetable Curry",
            tags: &["mains", "thai"],
            dietary: &["vegetarian"],
            minutes: 35,
            rating: 4.4,
            rating_count: 60,
        },
        Fixture {
            id: "l1",
            title: "Vegetable Lasagne",
            tags: &["mains", "italian"],
            dietary: &["vegetarian"],
            minutes: 70,
            rating: 4.7,
            rating_count: 250,
        },
        Fixture {
            id: "t2",
            title: "Thai Chicken Curry",
            tags: &["mains", "thai", "chicken"],
            dietary: &[],
            minutes: 40,
            rating: 4.6,
            rating_count: 180,
        },
        Fixture {
            id: "s1",
            title: "Tomato Soup",
            tags: &["soups"],
            dietary: &["vegetarian"],
            minutes: 30,
            rating: 4.0,
            rating_count: 15,
        },
    ]
}

/// Ten soups with varied ratings
pub fn soup_fixtures() -> Vec<Fixture<'static>> {
    const IDS: [&str; 10] = ["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9"];
    const TITLES: [&str; 10] = [
        "Tomato Soup",
        "Pumpkin Soup",
        "Minestrone Soup",
        "Lentil Soup",
        "Carrot Soup",
        "Pea Soup",
        "Onion Soup",
        "Leek Soup",
        "Chicken Noodle Soup",
        "Vegetable Soup",
    ];
    IDS.into_iter()
        .zip(TITLES)
        .enumerate()
        .map(|(i, (id, title))| Fixture {
            id,
            title,
            tags: &["soups"],
            dietary: &[],
            minutes: 20 + i as u32 * 5,
            rating: 3.5 + (i % 4) as f64 * 0.4,
            rating_count: 10 + i as u64 * 25,
        })
        .collect()
}
