//! Conversational recommendation engine
//!
//! One turn runs: refinement detection → ambiguity check → filter
//! extraction → merge with the previous turn → query embedding → filtered
//! similarity search → Bayesian ranking → session update.

mod ambiguity;
mod format;

pub use ambiguity::{detect_ambiguity, Clarification};
pub use format::{format_recipe, format_results};

use crate::config::{Config, RankingConfig};
use crate::embedding::{EmbeddingProvider, FastEmbedProvider};
use crate::error::{MiseError, Result};
use crate::extract::{self, FilterExtractor};
use crate::filters::{merge, Filters};
use crate::ranking::{resolve_limit, RankedRecipe, Ranker};
use crate::retrieval::Retriever;
use crate::session::{ChatSession, KeywordRefinement, RefinementDetector};
use crate::storage::RecipeStore;
use serde::Serialize;

/// Results of a searched turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    pub recipes: Vec<RankedRecipe>,
    /// Filters the search actually used (merged on refinement)
    pub filters: Filters,
    /// Whether the turn built on the previous one
    pub refined: bool,
}

/// What a turn produced
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Query too vague; nothing was searched or recorded
    Clarify(Clarification),
    Results(TurnResult),
}

/// Owns the pipeline stages behind their traits
pub struct Recommender {
    extractor: Box<dyn FilterExtractor>,
    embedder: Box<dyn EmbeddingProvider>,
    retriever: Box<dyn Retriever>,
    detector: Box<dyn RefinementDetector>,
    ranker: Ranker,
    ranking: RankingConfig,
    candidate_pool: usize,
}

impl Recommender {
    pub fn new(
        extractor: Box<dyn FilterExtractor>,
        embedder: Box<dyn EmbeddingProvider>,
        retriever: Box<dyn Retriever>,
        config: &Config,
    ) -> Self {
        Self {
            extractor,
            embedder,
            retriever,
            detector: Box::new(KeywordRefinement::default()),
            ranker: Ranker::new(&config.ranking),
            ranking: config.ranking.clone(),
            candidate_pool: config.retrieval.candidate_pool.max(1),
        }
    }

    /// Production wiring: SQLite store, local embedding model and the
    /// configured extractor
    pub fn from_config(config: &Config) -> Result<Self> {
        let retriever = RecipeStore::open(config)?;
        let embedder = FastEmbedProvider::new(&config.embedding.model)?;
        let extractor = extract::from_config(&config.llm)?;

        Ok(Self::new(
            extractor,
            Box::new(embedder),
            Box::new(retriever),
            config,
        ))
    }

    pub fn with_detector(mut self, detector: Box<dyn RefinementDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Stored vectors must come from the same space as query vectors
    pub fn validate_startup(&self) -> Result<()> {
        let expected = self.embedder.dimension();
        match self.retriever.embedding_dimension()? {
            Some(actual) if actual != expected => {
                Err(MiseError::EmbeddingDimensionMismatch { expected, actual })
            }
            Some(_) => {
                tracing::debug!(
                    "Embedding dimension {} matches model {}",
                    expected,
                    self.embedder.model_name()
                );
                Ok(())
            }
            None => {
                tracing::warn!("Recipe database has no embedded recipes; searches will be empty");
                Ok(())
            }
        }
    }

    /// Handle one user query.
    ///
    /// Retrieval and embedding failures abort the turn and leave `session`
    /// untouched. Extraction failures degrade to an unfiltered search.
    pub fn process_turn(&self, query: &str, session: &mut ChatSession) -> Result<TurnOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MiseError::InvalidQuery("query is empty".to_string()));
        }

        let context = session
            .context_for(query, self.detector.as_ref())
            .map(|(text, filters)| (text.to_string(), filters.clone()));

        if context.is_none() {
            if let Some(clarification) = detect_ambiguity(query) {
                tracing::info!("Asking for clarification on '{}'", query);
                return Ok(TurnOutcome::Clarify(clarification));
            }
        }

        let mut current = match self.extractor.extract(query) {
            Ok(filters) => filters,
            Err(e) => {
                tracing::warn!("Filter extraction failed, falling back to pure vector search: {}", e);
                Filters::new()
            }
        };
        current.apply_protein_exclusions();

        let refined = context.is_some();
        let (filters, search_text) = match context {
            Some((previous_query, previous_filters)) => {
                let merged = merge(&previous_filters, &current);
                tracing::info!("Merged filters: {}", merged.to_json());
                (merged, format!("{} {}", previous_query, query))
            }
            None => (current, query.to_string()),
        };

        let limit = resolve_limit(query, &filters, &self.ranking);
        let recipes = self.search(&search_text, &filters, limit, None)?;

        session.record(query, filters.clone(), recipes.clone());
        Ok(TurnOutcome::Results(TurnResult {
            recipes,
            filters,
            refined,
        }))
    }

    /// Recipes similar to result `index` (1-based) of the last turn, found
    /// by the reference title without filter extraction
    pub fn similar(&self, index: usize, session: &mut ChatSession) -> Result<TurnResult> {
        let reference_id = session
            .last()
            .and_then(|turn| turn.results.get(index.checked_sub(1)?))
            .map(|r| r.recipe.recipe_id.clone())
            .ok_or_else(|| {
                MiseError::InvalidQuery(format!("no result #{} in the last answer", index))
            })?;

        let reference = self
            .retriever
            .recipe(&reference_id)?
            .ok_or_else(|| MiseError::RecipeNotFound {
                id: reference_id.clone(),
            })?;

        let filters = Filters::new();
        let recipes = self.search(
            &reference.title,
            &filters,
            self.ranking.default_limit.clamp(1, self.ranking.max_limit.max(1)),
            Some(&reference.recipe_id),
        )?;

        session.record(
            format!("Similar to: {}", reference.title),
            filters.clone(),
            recipes.clone(),
        );
        Ok(TurnResult {
            recipes,
            filters,
            refined: false,
        })
    }

    fn search(
        &self,
        text: &str,
        filters: &Filters,
        limit: usize,
        exclude_id: Option<&str>,
    ) -> Result<Vec<RankedRecipe>> {
        let embedding = self.embedder.embed(text)?;

        let mut candidates = self.retriever.search(
            filters,
            &embedding,
            filters.name_pattern(),
            self.candidate_pool,
        )?;
        if let Some(id) = exclude_id {
            candidates.retain(|c| c.recipe_id != id);
        }
        tracing::debug!("{} candidates for '{}'", candidates.len(), text);

        Ok(self.ranker.rank(candidates, limit))
    }
}
