//! Natural-language query to structured `Filters`
//!
//! Two backends:
//! - `LlmFilterExtractor` asks a chat-completion endpoint for a JSON object
//! - `KeywordFilterExtractor` runs offline with regex and vocabulary rules

mod keyword;
mod llm;
mod prompt;

pub use keyword::KeywordFilterExtractor;
pub use llm::LlmFilterExtractor;
pub use prompt::build_prompt;

use crate::config::LlmConfig;
use crate::error::{MiseError, Result};
use crate::filters::Filters;

/// Turns one query into filters. Failures are recoverable: the caller
/// falls back to an unfiltered search.
pub trait FilterExtractor: Send + Sync {
    fn extract(&self, query: &str) -> Result<Filters>;
}

/// Pick the backend named by `config`
pub fn from_config(config: &LlmConfig) -> Result<Box<dyn FilterExtractor>> {
    if config.enabled {
        tracing::info!(
            "Using {} filter extraction ({})",
            config.provider,
            config.model
        );
        Ok(Box::new(LlmFilterExtractor::new(config.clone())?))
    } else {
        tracing::info!("LLM disabled, using keyword filter extraction");
        Ok(Box::new(KeywordFilterExtractor::new()))
    }
}

/// Parse a model reply into filters.
///
/// Accepts Markdown code fences and surrounding prose; the outermost
/// `{...}` is taken as the JSON object.
pub fn parse_filter_response(content: &str) -> Result<Filters> {
    let cleaned = strip_code_fence(content.trim());

    let json_str = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => {
            return Err(MiseError::Extraction(format!(
                "No JSON object in response: {}",
                truncate(content, 120)
            )))
        }
    };

    serde_json::from_str(json_str).map_err(|e| MiseError::Json {
        source: e,
        context: "Failed to parse filter JSON".to_string(),
    })
}

fn strip_code_fence(text: &str) -> &str {
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
