use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_FEEDBACK_MODEL: &str = "gpt-4o-mini";

/// Application configuration loaded from environment variables.
/// Everything has a default; only the embedding and feedback endpoints pull in more.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// JSON skill vocabulary; the built-in vocabulary is used when unset.
    pub skill_vocabulary_path: Option<PathBuf>,
    /// JSON overrides for scoring weights, thresholds and cutoffs.
    pub scoring_config_path: Option<PathBuf>,
    /// OpenAI-compatible embeddings endpoint. Unset means the hashing embedder.
    pub embedding_api_url: Option<String>,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    /// OpenAI-compatible chat endpoint for narrative feedback. Unset means none.
    pub feedback_api_url: Option<String>,
    pub feedback_api_key: Option<String>,
    pub feedback_model: String,
    pub max_concurrent_evaluations: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            skill_vocabulary_path: get("SKILL_VOCABULARY_PATH").map(PathBuf::from),
            scoring_config_path: get("SCORING_CONFIG_PATH").map(PathBuf::from),
            embedding_api_url: get("EMBEDDING_API_URL"),
            embedding_api_key: get("EMBEDDING_API_KEY"),
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            feedback_api_url: get("FEEDBACK_API_URL"),
            feedback_api_key: get("FEEDBACK_API_KEY"),
            feedback_model: get("FEEDBACK_MODEL")
                .unwrap_or_else(|| DEFAULT_FEEDBACK_MODEL.to_string()),
            max_concurrent_evaluations: get("MAX_CONCURRENT_EVALUATIONS")
                .unwrap_or_else(|| "8".to_string())
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .context("MAX_CONCURRENT_EVALUATIONS must be a positive integer")?,
        })
    }
}
