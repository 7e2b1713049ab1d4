//! Recognized food vocabulary shared by extraction, refinement detection
//! and ambiguity checks

/// Main proteins; a query asks for at most one of these
pub const PROTEINS: &[&str] = &[
    "chicken", "beef", "pork", "fish", "lamb", "turkey", "seafood", "duck",
];

/// Proteins that exclude each other when one is requested
pub const COMPETING_PROTEINS: &[&str] = &["chicken", "beef", "pork", "lamb", "fish"];

/// Dietary words that mark a short follow-up as a refinement
pub const DIETARY_TERMS: &[&str] = &["vegetarian", "vegan", "gluten"];

pub const CUISINES: &[&str] = &[
    "indian", "italian", "chinese", "mexican", "thai", "french", "japanese", "greek",
    "american", "spanish", "korean", "vietnamese", "turkish", "moroccan", "lebanese",
];

/// Words that carry no searchable intent on their own
pub const VAGUE_TERMS: &[&str] = &[
    "something", "anything", "good", "nice", "tasty", "yummy", "delicious", "great",
];

/// Filler that may surround vague terms without adding an entity
pub const FILLER_WORDS: &[&str] = &[
    "i", "me", "my", "we", "you", "a", "an", "the", "some", "any", "to", "for", "of", "please",
    "want", "wanna", "like", "would", "could", "can", "give", "show", "find", "get", "need",
    "make", "cook", "eat", "have", "what", "should", "is", "it", "really", "very", "so", "just",
    "food", "dish", "dishes", "meal", "idea", "ideas", "today", "tonight",
];

/// Lowercased alphanumeric words of `text`
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `phrase` (one or more words) appears as whole words in `tokens`
pub fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > tokens.len() {
        return false;
    }
    tokens
        .windows(needle.len())
        .any(|window| window.iter().zip(&needle).all(|(t, n)| t == n))
}

/// Whether `tokens` contain `term` or its plain plural
pub fn contains_term(tokens: &[String], term: &str) -> bool {
    tokens
        .iter()
        .any(|t| t == term || t.strip_suffix('s') == Some(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_split_punctuation() {
        assert_eq!(words("Gluten-free, please!"), vec!["gluten", "free", "please"]);
    }

    #[test]
    fn test_phrase_matches_whole_words_only() {
        let tokens = words("peanut butter cookies");
        assert!(!contains_phrase(&tokens, "but"));
        assert!(contains_phrase(&tokens, "butter cookies"));
    }

    #[test]
    fn test_term_accepts_plural() {
        let tokens = words("any turkeys left");
        assert!(contains_term(&tokens, "turkey"));
        assert!(!contains_term(&tokens, "duck"));
    }
}
