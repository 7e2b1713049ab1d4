//! How many results a turn should return

use crate::config::RankingConfig;
use crate::filters::Filters;
use regex::Regex;
use std::sync::OnceLock;

fn count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(\d{1,3}|one|two|three|four|five|six|seven|eight|nine|ten)\s+((?:[a-z-]+\s+){0,3}?)(recipes?|results?|ideas?|dish(?:es)?|meals?|options?|suggestions?)\b",
        )
        .expect("count pattern is valid")
    })
}

fn word_number(word: &str) -> Option<usize> {
    let n = match word.to_lowercase().as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        digits => return digits.parse().ok(),
    };
    Some(n)
}

/// Count requested in the query text, e.g. "5 recipes" or "three easy
/// breakfast ideas". Durations such as "20 minute meals" are not counts.
pub fn requested_count(query: &str) -> Option<usize> {
    count_pattern().captures_iter(query).find_map(|caps| {
        let between = caps.get(2).map_or("", |m| m.as_str()).to_lowercase();
        let is_duration = between
            .split_whitespace()
            .any(|w| w.starts_with("min") || w.starts_with("hour") || w.starts_with("hr"));
        if is_duration {
            return None;
        }
        word_number(&caps[1])
    })
}

/// Result count for a turn: the extracted `result_limit`, else a count in
/// the query text, else the configured default; clamped to `1..=max_limit`
pub fn resolve_limit(query: &str, filters: &Filters, config: &RankingConfig) -> usize {
    let requested = filters
        .result_limit
        .or_else(|| requested_count(query))
        .unwrap_or(config.default_limit);

    requested.clamp(1, config.max_limit.max(1))
}
