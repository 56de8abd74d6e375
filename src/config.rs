//! Runtime configuration for the database connection and the completion
//! backend. The backend choice is resolved once, here, into an enum; nothing
//! downstream branches on backend name strings.

use crate::error::{ChatError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;
use std::time::Duration;

/// Minimum spacing between consecutive completion calls.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(1);

/// Total completion attempts before a sustained rate limit becomes fatal.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-thinking-exp-01-21";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// MySQL connection parameters, externally configurable at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
}

impl DbConfig {
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            user: "root".to_string(),
            password: String::new(),
            database: "elevate_v2".to_string(),
            port: 3306,
        }
    }
}

/// Backend name as it appears on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Remote hosted completion API (key-based auth, non-streaming)
    Gemini,
    /// Local completion daemon (no auth)
    Ollama,
}

/// Fully resolved completion backend.
#[derive(Debug, Clone)]
pub enum CompletionBackend {
    Gemini { api_key: String, model: String },
    Ollama { base_url: String, model: String },
}

/// Completion client settings: which backend, and the request budget.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: CompletionBackend,
    pub rate_limit_delay: Duration,
    pub max_retries: u32,
}

impl LlmConfig {
    pub fn new(backend: CompletionBackend) -> Self {
        Self {
            backend,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Resolve a backend kind from the environment. The remote backend
    /// requires `GEMINI_API_KEY`; the local daemon needs nothing.
    pub fn from_env(kind: BackendKind) -> Result<Self> {
        let backend = match kind {
            BackendKind::Gemini => {
                let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
                    ChatError::Config("GEMINI_API_KEY is not set".to_string())
                })?;
                let model = std::env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
                CompletionBackend::Gemini { api_key, model }
            }
            BackendKind::Ollama => {
                let base_url = std::env::var("OLLAMA_URL")
                    .unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
                let model = std::env::var("OLLAMA_MODEL")
                    .unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string());
                CompletionBackend::Ollama { base_url, model }
            }
        };
        Ok(Self::new(backend))
    }

    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_defaults() {
        let db = DbConfig::default();
        assert_eq!(db.port, 3306);
        assert_eq!(db.host, "localhost");
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::new(CompletionBackend::Ollama {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
        });
        assert_eq!(config.rate_limit_delay, Duration::from_secs(1));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_builder_overrides() {
        let config = LlmConfig::new(CompletionBackend::Ollama {
            base_url: "http://localhost:9999".to_string(),
            model: "test".to_string(),
        })
        .with_rate_limit_delay(Duration::from_millis(5))
        .with_max_retries(5);
        assert_eq!(config.rate_limit_delay, Duration::from_millis(5));
        assert_eq!(config.max_retries, 5);
    }
}
