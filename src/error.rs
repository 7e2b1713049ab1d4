use std::path::PathBuf;
use thiserror::Error;

/// Main error type for mise
#[derive(Error, Debug)]
pub enum MiseError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// The retriever kept failing after every retry
    #[error("Recipe search unavailable after {attempts} attempts: {message}")]
    RetrieverUnavailable { attempts: u32, message: String },

    /// Stored vectors and the embedding model disagree on dimension
    #[error("Embedding dimension mismatch: model produces {expected}, database stores {actual}")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },

    /// Embedding generation errors
    #[error("Embedding error: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingError),

    /// Filter extraction errors
    #[error("Filter extraction failed: {0}")]
    Extraction(String),

    /// Query rejected before processing
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Recipe lookup by identifier found nothing
    #[error("Recipe not found: {id}")]
    RecipeNotFound { id: String },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MiseError {
    /// Message suitable for the chat transcript
    pub fn user_message(&self) -> String {
        match self {
            MiseError::RetrieverUnavailable { .. } | MiseError::Pool(_) => {
                "Sorry, I'm having connection issues reaching the recipe database. Please try again in a moment."
                    .to_string()
            }
            MiseError::Embedding(_) => {
                "Sorry, I couldn't understand that query right now. Please try again.".to_string()
            }
            other => format!("Sorry, something went wrong: {}", other),
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for mise operations
pub type Result<T> = std::result::Result<T, MiseError>;
