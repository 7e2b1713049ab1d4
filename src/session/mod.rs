//! Conversation memory for one chat run
//!
//! A session keeps a bounded history of processed turns so follow-up
//! queries can inherit the previous turn's filters. It lives only as long
//! as the chat process.

mod refinement;

pub use refinement::{KeywordRefinement, RefinementDetector, REFINEMENT_KEYWORDS};

use crate::filters::Filters;
use crate::ranking::RankedRecipe;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

/// One successfully processed query
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub query: String,
    /// Filters actually used for the search (after merging)
    pub filters: Filters,
    pub results: Vec<RankedRecipe>,
    pub at: DateTime<Utc>,
}

/// Bounded query history, oldest evicted first
#[derive(Debug)]
pub struct ChatSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    capacity: usize,
    turns: VecDeque<Turn>,
}

impl ChatSession {
    /// Create an empty session remembering at most `capacity` turns
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        tracing::debug!("Chat session initialized with max history: {}", capacity);
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            capacity,
            turns: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a processed turn, evicting the oldest when full
    pub fn record(&mut self, query: impl Into<String>, filters: Filters, results: Vec<RankedRecipe>) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(Turn {
            query: query.into(),
            filters,
            results,
            at: Utc::now(),
        });
        tracing::debug!("Added query to history. Total queries: {}", self.turns.len());
    }

    /// Most recent turn
    pub fn last(&self) -> Option<&Turn> {
        self.turns.back()
    }

    /// Turn by 1-based index, oldest first
    pub fn turn(&self, index: usize) -> Option<&Turn> {
        index.checked_sub(1).and_then(|i| self.turns.get(i))
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Previous query text and filters when `query` refines the last turn
    pub fn context_for(
        &self,
        query: &str,
        detector: &dyn RefinementDetector,
    ) -> Option<(&str, &Filters)> {
        let last = self.last()?;

        if detector.is_refinement(query) {
            tracing::info!(
                "Detected refinement query. Previous: '{}' Current: '{}'",
                last.query,
                query
            );
            Some((last.query.as_str(), &last.filters))
        } else {
            None
        }
    }

    /// Human-readable list of past queries
    pub fn history_summary(&self) -> String {
        if self.turns.is_empty() {
            return "No previous queries in this session.".to_string();
        }

        let rule = "-".repeat(60);
        let mut summary = format!("\nQuery History:\n{}\n", rule);
        for (i, turn) in self.turns.iter().enumerate() {
            summary.push_str(&format!(
                "{}. {} ({} results)\n",
                i + 1,
                turn.query,
                turn.results.len()
            ));
        }
        summary.push_str(&rule);
        summary.push('\n');
        summary
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        tracing::info!("Session history cleared");
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
