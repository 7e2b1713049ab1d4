//! Final ordering of retrieved candidates
//!
//! Each candidate's score blends query similarity with a Bayesian-average
//! rating, so a 5.0 from one review does not outrank a 4.8 from hundreds.

mod bayesian;
mod limit;

pub use bayesian::{percentile_linear, RatingPrior};
pub use limit::{requested_count, resolve_limit};

use crate::config::RankingConfig;
use crate::retrieval::Candidate;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A candidate with its computed rating and final score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecipe {
    #[serde(flatten)]
    pub recipe: Candidate,
    pub bayesian_rating: f64,
    pub score: f64,
}

/// Blends similarity with the Bayesian rating and orders the pool
#[derive(Debug, Clone)]
pub struct Ranker {
    similarity_weight: f64,
    rating_weight: f64,
    confidence_percentile: f64,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(&RankingConfig::default())
    }
}

impl Ranker {
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            similarity_weight: config.similarity_weight,
            rating_weight: config.rating_weight,
            confidence_percentile: config.confidence_percentile,
        }
    }

    /// Rank `candidates` and keep the best `limit`.
    ///
    /// Duplicated recipe ids collapse to their best-similarity row before
    /// pool statistics are computed. Equal scores keep input order.
    pub fn rank(&self, candidates: Vec<Candidate>, limit: usize) -> Vec<RankedRecipe> {
        let candidates = deduplicate(candidates);
        if candidates.is_empty() {
            return Vec::new();
        }

        let prior = RatingPrior::from_candidates(&candidates, self.confidence_percentile);
        tracing::debug!(
            "Ranking {} candidates (global_avg={:.3}, confidence={:.1})",
            candidates.len(),
            prior.global_avg,
            prior.confidence
        );

        let mut ranked: Vec<RankedRecipe> = candidates
            .into_iter()
            .map(|recipe| {
                let bayesian_rating = prior.bayesian_rating(&recipe);
                let score = self.score(recipe.similarity, bayesian_rating);
                RankedRecipe {
                    recipe,
                    bayesian_rating,
                    score,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(limit);
        ranked
    }

    fn score(&self, similarity: f64, bayesian_rating: f64) -> f64 {
        similarity * self.similarity_weight + (bayesian_rating / 5.0) * self.rating_weight
    }
}

/// One row per recipe id, keeping the first position and the best similarity
fn deduplicate(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut positions: AHashMap<String, usize> = AHashMap::with_capacity(candidates.len());
    let mut unique: Vec<Candidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match positions.get(&candidate.recipe_id) {
            Some(&index) => {
                if candidate.similarity > unique[index].similarity {
                    unique[index] = candidate;
                }
            }
            None => {
                positions.insert(candidate.recipe_id.clone(), unique.len());
                unique.push(candidate);
            }
        }
    }

    unique
}
