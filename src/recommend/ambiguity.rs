//! Queries too vague to search

use crate::filters::vocabulary::{self, FILLER_WORDS, VAGUE_TERMS};
use serde::Serialize;
use std::fmt;

/// A question to send back instead of searching
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clarification {
    pub message: String,
    pub suggestions: Vec<String>,
}

impl fmt::Display for Clarification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.suggestions.is_empty() {
            write!(f, " For example: '{}'", self.suggestions.join("' or '"))?;
        }
        Ok(())
    }
}

const SPEED_TERMS: &[&str] = &["quick", "fast", "speedy"];

/// A clarification when the query has only generic words (vague adjectives
/// or filler) and names nothing searchable
pub fn detect_ambiguity(query: &str) -> Option<Clarification> {
    let tokens = vocabulary::words(query);
    if tokens.is_empty() {
        return None;
    }

    let generic = tokens.iter().all(|t| {
        let t = t.as_str();
        FILLER_WORDS.contains(&t) || VAGUE_TERMS.contains(&t) || SPEED_TERMS.contains(&t)
    });
    if !generic {
        return None;
    }

    if tokens.iter().any(|t| VAGUE_TERMS.contains(&t.as_str())) {
        return Some(Clarification {
            message: "What type of dish are you looking for?".to_string(),
            suggestions: vec![
                "easy vegetarian pasta".to_string(),
                "quick chicken recipes".to_string(),
            ],
        });
    }

    if tokens.iter().any(|t| SPEED_TERMS.contains(&t.as_str())) {
        return Some(Clarification {
            message: "How much time do you have?".to_string(),
            suggestions: vec![
                "under 15 minutes".to_string(),
                "under 30 minutes".to_string(),
            ],
        });
    }

    None
}
