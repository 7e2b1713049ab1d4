//! Configuration management for mise
//!
//! Loads the TOML configuration file, applies `MISE_SECTION__KEY`
//! environment overrides and validates the result before anything touches
//! the database or the language model.

use crate::error::{MiseError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Recipe database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    /// Only recipes supported by this device revision are returned
    pub device_version: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("~/.mise/recipes.sqlite"),
            device_version: "TM6".to_string(),
            pool_size: 4,
            busy_timeout_ms: 5000,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "bge-base-en-v1.5".to_string(),
            dimension: 768,
        }
    }
}

/// LLM configuration for filter extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// When disabled, filters come from the offline keyword extractor
    pub enabled: bool,
    pub provider: String,
    pub base_url: String,
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "groq".to_string(),
            base_url: "https://api.groq.com/openai".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.0,
            timeout_secs: 10,
            max_retries: 3,
        }
    }
}

/// Hybrid retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Rows kept after the vector stage and handed to the ranker
    pub candidate_pool: usize,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_pool: 100,
            max_retries: 3,
            initial_backoff_ms: 1000,
        }
    }
}

/// Ranking weights and result limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    pub similarity_weight: f64,
    pub rating_weight: f64,
    pub default_limit: usize,
    pub max_limit: usize,
    /// Percentile of rating counts used as the Bayesian confidence threshold
    pub confidence_percentile: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            similarity_weight: 0.6,
            rating_weight: 0.4,
            default_limit: 2,
            max_limit: 50,
            confidence_percentile: 0.1,
        }
    }
}

/// Conversation memory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub memory_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { memory_size: 10 }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MiseError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| MiseError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load from `path`, or from defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Config file not found at {:?}, using defaults. Run 'mise config init' to create one.",
                path
            );
            let mut config = Config::default();
            config.apply_env_overrides();
            ConfigValidator::validate(&config)?;
            return Ok(config);
        }

        Self::load(path)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| MiseError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: MISE_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("MISE_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "LLM__ENABLED" => self.llm.enabled = parse_value(path, value)?,
            "LLM__PROVIDER" => self.llm.provider = value.to_string(),
            "LLM__BASE_URL" => self.llm.base_url = value.to_string(),
            "LLM__MODEL" => self.llm.model = value.to_string(),
            "LLM__API_KEY_ENV" => self.llm.api_key_env = value.to_string(),
            "EMBEDDING__MODEL" => self.embedding.model = value.to_string(),
            "EMBEDDING__DIMENSION" => self.embedding.dimension = parse_value(path, value)?,
            "STORAGE__DATABASE_PATH" => self.storage.database_path = PathBuf::from(value),
            "STORAGE__DEVICE_VERSION" => self.storage.device_version = value.to_string(),
            "RANKING__DEFAULT_LIMIT" => self.ranking.default_limit = parse_value(path, value)?,
            "RANKING__MAX_LIMIT" => self.ranking.max_limit = parse_value(path, value)?,
            "SESSION__MEMORY_SIZE" => self.session.memory_size = parse_value(path, value)?,
            "RETRIEVAL__MAX_RETRIES" => self.retrieval.max_retries = parse_value(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Database path with a leading `~/` expanded
    pub fn database_path(&self) -> Result<PathBuf> {
        expand_home(&self.storage.database_path)
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MiseError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("mise").join("config.toml"))
    }
}

fn parse_value<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| MiseError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| MiseError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| MiseError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            ranking: RankingConfig::default(),
            session: SessionConfig::default(),
        }
    }
}
