use crate::config::Config;
use crate::embedding::FastEmbedProvider;
use crate::error::{MiseError, Result, ValidationError};

/// Upper bound for `retrieval.max_retries`; backoff doubles on each retry
const MAX_RETRIES: u32 = 8;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_llm(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_ranking(config, &mut errors);
        Self::validate_session(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MiseError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.database_path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.database_path",
                "Database path cannot be empty",
            ));
        }

        if config.storage.device_version.trim().is_empty() {
            errors.push(ValidationError::new(
                "storage.device_version",
                "Device version cannot be empty",
            ));
        }

        if config.storage.pool_size == 0 {
            errors.push(ValidationError::new(
                "storage.pool_size",
                "Pool size must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }

        if config.embedding.dimension == 0 {
            errors.push(ValidationError::new(
                "embedding.dimension",
                "Embedding dimension must be greater than 0",
            ));
        }

        match FastEmbedProvider::known_dimension(&config.embedding.model) {
            Some(known) if known != config.embedding.dimension => {
                errors.push(ValidationError::new(
                    "embedding.dimension",
                    format!(
                        "Model {} produces {}-dimensional vectors, configured {}",
                        config.embedding.model, known, config.embedding.dimension
                    ),
                ));
            }
            Some(_) => {}
            None if !config.embedding.model.is_empty() => {
                errors.push(ValidationError::new(
                    "embedding.model",
                    format!("Unsupported embedding model: {}", config.embedding.model),
                ));
            }
            None => {}
        }
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        let provider = &config.llm.provider;
        let valid_providers = ["groq", "openai", "ollama"];
        if !valid_providers.contains(&provider.as_str()) {
            errors.push(ValidationError::new(
                "llm.provider",
                format!(
                    "Provider must be one of {:?}, got '{}'",
                    valid_providers, provider
                ),
            ));
        }

        // Ollama runs locally without a key
        if config.llm.enabled && provider != "ollama" {
            let env_var = &config.llm.api_key_env;
            match std::env::var(env_var) {
                Ok(key) if key.is_empty() => errors.push(ValidationError::new(
                    "llm.api_key_env",
                    format!("Environment variable {} is empty", env_var),
                )),
                Ok(_) => {}
                Err(_) => errors.push(ValidationError::new(
                    "llm.api_key_env",
                    format!("Environment variable {} is not set", env_var),
                )),
            }
        }

        let temp = config.llm.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "llm.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }

        if config.llm.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "llm.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.retrieval.candidate_pool == 0 {
            errors.push(ValidationError::new(
                "retrieval.candidate_pool",
                "Candidate pool must be greater than 0",
            ));
        }

        if config.retrieval.max_retries > MAX_RETRIES {
            errors.push(ValidationError::new(
                "retrieval.max_retries",
                format!(
                    "At most {} retries are allowed, got {}",
                    MAX_RETRIES, config.retrieval.max_retries
                ),
            ));
        }
    }

    fn validate_ranking(config: &Config, errors: &mut Vec<ValidationError>) {
        let ranking = &config.ranking;

        for (path, weight) in [
            ("ranking.similarity_weight", ranking.similarity_weight),
            ("ranking.rating_weight", ranking.rating_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                errors.push(ValidationError::new(
                    path,
                    format!("Weight must be between 0.0 and 1.0, got {}", weight),
                ));
            }
        }

        let total = ranking.similarity_weight + ranking.rating_weight;
        if (total - 1.0).abs() > 1e-6 {
            errors.push(ValidationError::new(
                "ranking",
                format!("Similarity and rating weights must sum to 1.0, got {}", total),
            ));
        }

        if ranking.default_limit == 0 {
            errors.push(ValidationError::new(
                "ranking.default_limit",
                "Default limit must be greater than 0",
            ));
        }

        if ranking.max_limit < ranking.default_limit {
            errors.push(ValidationError::new(
                "ranking.max_limit",
                format!(
                    "Max limit ({}) cannot be below the default limit ({})",
                    ranking.max_limit, ranking.default_limit
                ),
            ));
        }

        if !(0.0..=1.0).contains(&ranking.confidence_percentile) {
            errors.push(ValidationError::new(
                "ranking.confidence_percentile",
                format!(
                    "Percentile must be between 0.0 and 1.0, got {}",
                    ranking.confidence_percentile
                ),
            ));
        }
    }

    fn validate_session(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.session.memory_size == 0 {
            errors.push(ValidationError::new(
                "session.memory_size",
                "Memory size must be greater than 0",
            ));
        }
    }
}
