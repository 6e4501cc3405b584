use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::session::Difficulty;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub generation_timeout: Duration,
    pub default_difficulty: Difficulty,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let timeout_secs = std::env::var("GENERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse::<u64>()
            .context("GENERATION_TIMEOUT_SECS must be a whole number of seconds")?;

        let default_difficulty = std::env::var("DEFAULT_DIFFICULTY")
            .unwrap_or_else(|_| "medium".to_string())
            .parse::<Difficulty>()
            .context("DEFAULT_DIFFICULTY must be one of beginner, medium, advanced")?;

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            generation_timeout: Duration::from_secs(timeout_secs),
            default_difficulty,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
