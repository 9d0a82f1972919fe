//! Configuration management for CallMate
//!
//! Configuration is loaded from environment variables (optionally seeded
//! from a `.env` file by the binary).

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenAI API URL
    pub openai_api_url: String,
    /// OpenAI API key (provider is not registered without it)
    pub openai_api_key: Option<String>,

    /// Anthropic API URL
    pub anthropic_api_url: String,
    /// Anthropic API key
    pub anthropic_api_key: Option<String>,

    /// Google Generative Language API URL
    pub google_api_url: String,
    /// Google API key
    pub google_api_key: Option<String>,

    /// Upper bound on a single provider call
    pub provider_timeout: Duration,

    /// Optional JSON routing table replacing the built-in one
    pub routing_config_path: Option<PathBuf>,

    /// Root directory of prompt templates
    pub prompts_dir: PathBuf,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let provider_timeout_secs: u64 = env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("Invalid PROVIDER_TIMEOUT_SECS")?;
        if provider_timeout_secs == 0 {
            anyhow::bail!("PROVIDER_TIMEOUT_SECS must be greater than zero");
        }

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") | Err(_) => LogFormat::Pretty,
            Ok(other) => anyhow::bail!("Invalid LOG_FORMAT: {}", other),
        };

        Ok(Self {
            openai_api_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),

            anthropic_api_url: env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1".to_string()),
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),

            google_api_url: env::var("GOOGLE_API_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            google_api_key: non_empty_var("GOOGLE_API_KEY"),

            provider_timeout: Duration::from_secs(provider_timeout_secs),

            routing_config_path: env::var("ROUTING_CONFIG_PATH").ok().map(PathBuf::from),

            prompts_dir: env::var("PROMPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("prompts")),

            log_format,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
