//! Deciding whether a follow-up query refines the previous one

use crate::filters::vocabulary::{self, contains_phrase, contains_term};

/// Strategy deciding whether a query builds on the previous turn.
///
/// Only consulted when a previous turn exists.
pub trait RefinementDetector: Send + Sync {
    fn is_refinement(&self, query: &str) -> bool;
}

/// Words and phrases that explicitly extend or narrow the last query
pub const REFINEMENT_KEYWORDS: &[&str] = &[
    "under",
    "less than",
    "more than",
    "faster",
    "quicker",
    "easier",
    "harder",
    "with",
    "without",
    "also",
    "but",
    "instead",
    "only",
    "make it",
];

/// Keyword and length heuristic
///
/// 1. an explicit refinement keyword anywhere means refinement
/// 2. a short query naming a protein, dietary term or cuisine is additive
/// 3. everything else (including long queries) starts over
#[derive(Debug, Clone)]
pub struct KeywordRefinement {
    /// Queries with at most this many words count as short
    pub short_query_words: usize,
}

impl Default for KeywordRefinement {
    fn default() -> Self {
        Self {
            short_query_words: 6,
        }
    }
}

impl KeywordRefinement {
    fn names_entity(tokens: &[String]) -> bool {
        vocabulary::PROTEINS
            .iter()
            .chain(vocabulary::DIETARY_TERMS)
            .chain(vocabulary::CUISINES)
            .any(|term| contains_term(tokens, term))
    }
}

impl RefinementDetector for KeywordRefinement {
    fn is_refinement(&self, query: &str) -> bool {
        let tokens = vocabulary::words(query);
        if tokens.is_empty() {
            return false;
        }

        if REFINEMENT_KEYWORDS
            .iter()
            .any(|keyword| contains_phrase(&tokens, keyword))
        {
            return true;
        }

        let word_count = query.split_whitespace().count();
        word_count <= self.short_query_words && Self::names_entity(&tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(query: &str) -> bool {
        KeywordRefinement::default().is_refinement(query)
    }

    #[test]
    fn test_explicit_keywords() {
        assert!(detect("under 20 minutes"));
        assert!(detect("but without nuts"));
        assert!(detect("make it thai"));
        assert!(detect("less than 300 calories"));
    }

    #[test]
    fn test_keyword_inside_longer_word_does_not_count() {
        assert!(!detect("peanut butter"));
        assert!(!detect("wonderful underrated classics from the old family cookbook today"));
    }

    #[test]
    fn test_short_query_with_protein_or_diet() {
        assert!(detect("I want chicken ones"));
        assert!(detect("vegan please"));
        assert!(detect("gluten-free"));
    }

    #[test]
    fn test_long_query_without_keywords_is_new() {
        assert!(!detect(
            "give me a hearty chicken stew that my whole family will enjoy tonight"
        ));
    }

    #[test]
    fn test_gray_zone_without_hits_is_new() {
        assert!(!detect("what about a big batch of soup"));
        assert!(!detect("chocolate cake"));
    }

    #[test]
    fn test_empty_query() {
        assert!(!detect("   "));
    }
}
