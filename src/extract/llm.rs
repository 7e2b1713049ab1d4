use super::{parse_filter_response, prompt::build_prompt, FilterExtractor};
use crate::config::LlmConfig;
use crate::error::{MiseError, Result};
use crate::filters::Filters;
use crate::retrieval::{with_backoff, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You extract recipe search filters and reply with JSON only.";

/// Filter extraction through a chat-completion endpoint
pub struct LlmFilterExtractor {
    client: reqwest::blocking::Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl LlmFilterExtractor {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| MiseError::Extraction(format!("Failed to build HTTP client: {}", e)))?;

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() && config.provider != "ollama" {
            tracing::warn!(
                "{} is not set; {} requests will likely be rejected",
                config.api_key_env,
                config.provider
            );
        }

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        match self.config.provider.as_str() {
            "ollama" => self.call_ollama(prompt),
            "openai" | "groq" => self.call_openai(prompt),
            other => Err(MiseError::Extraction(format!(
                "Unknown LLM provider: {}",
                other
            ))),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    // ─── Ollama ──────────────────────────────────────────────

    fn call_ollama(&self, prompt: &str) -> Result<String> {
        let req = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: messages(prompt),
            stream: false,
            format: "json".to_string(),
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        let resp = self
            .client
            .post(self.endpoint("/api/chat"))
            .json(&req)
            .send()
            .map_err(|e| MiseError::Extraction(format!("Ollama chat request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(MiseError::Extraction(format!(
                "Ollama chat API returned {}: {}",
                status, body
            )));
        }

        let body: OllamaChatResponse = resp
            .json()
            .map_err(|e| MiseError::Extraction(format!("Invalid Ollama response: {}", e)))?;
        Ok(body.message.content)
    }

    // ─── OpenAI-compatible ───────────────────────────────────

    fn call_openai(&self, prompt: &str) -> Result<String> {
        let req = OpenAiChatRequest {
            model: self.config.model.clone(),
            messages: messages(prompt),
            temperature: self.config.temperature,
        };

        let mut request = self
            .client
            .post(self.endpoint("/v1/chat/completions"))
            .json(&req);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().map_err(|e| {
            MiseError::Extraction(format!("{} chat request failed: {}", self.config.provider, e))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(MiseError::Extraction(format!(
                "{} chat API returned {}: {}",
                self.config.provider, status, body
            )));
        }

        let body: OpenAiChatResponse = resp
            .json()
            .map_err(|e| MiseError::Extraction(format!("Invalid chat response: {}", e)))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| MiseError::Extraction("Chat response had no content".to_string()))
    }
}

impl FilterExtractor for LlmFilterExtractor {
    fn extract(&self, query: &str) -> Result<Filters> {
        let prompt = build_prompt(query);
        let policy = RetryPolicy::with_retries(self.config.max_retries, 500);

        let content = with_backoff(policy, "filter extraction", || self.complete(&prompt))
            .map_err(|(e, _)| e)?;
        tracing::debug!("Filter extraction reply: {}", content);

        parse_filter_response(&content)
    }
}

fn messages(prompt: &str) -> Vec<Message> {
    vec![
        Message {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        },
        Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        },
    ]
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    format: String,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(provider: &str, base_url: &str) -> LlmFilterExtractor {
        LlmFilterExtractor::new(LlmConfig {
            enabled: true,
            provider: provider.to_string(),
            base_url: base_url.to_string(),
            api_key_env: "MISE_TEST_UNSET_KEY".to_string(),
            max_retries: 0,
            timeout_secs: 1,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let llm = extractor("ollama", "http://localhost:11434/");
        assert_eq!(llm.endpoint("/api/chat"), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let llm = extractor("gemini", "http://localhost:1");
        assert!(matches!(llm.extract("soup"), Err(MiseError::Extraction(_))));
    }

    #[test]
    fn test_unreachable_endpoint_is_an_error() {
        // Port 9 (discard) is closed on test machines
        let llm = extractor("openai", "http://127.0.0.1:9");
        assert!(llm.extract("vegan soup").is_err());
    }

    #[test]
    fn test_openai_response_shape() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"max_time\":15}"}}]}"#;
        let parsed: OpenAiChatResponse = serde_json::from_str(body).unwrap();
        let content = parsed.choices[0].message.content.as_deref().unwrap();
        assert_eq!(parse_filter_response(content).unwrap().max_time, Some(15));
    }
}
