//! OpenAI configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;
use docrag_core::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

const EMBEDDING_MODEL_VAR: &str = "OPENAI_EMBEDDING_MODEL";

/// Configuration for the OpenAI client
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    #[serde(skip_serializing, default)]
    pub api_key: String,
    pub api_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Create configuration from environment variables (and a `.env` file, if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Configuration(
                "OPENAI_API_KEY environment variable not found".to_string()
            ))?;

        let api_url = lookup("OPENAI_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let embedding_model = lookup(EMBEDDING_MODEL_VAR)
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

        let chat_model = lookup("OPENAI_CHAT_MODEL")
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        let timeout = match lookup("OPENAI_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| Error::Configuration(
                    format!("OPENAI_TIMEOUT_SECS must be a whole number of seconds, got {:?}", raw)
                ))?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(60),
        };

        Ok(Self {
            api_key,
            api_url,
            embedding_model,
            chat_model,
            timeout,
        })
    }

    /// Create configuration with explicit values
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Whether the embedding model was chosen explicitly in the environment
    pub fn embedding_model_overridden() -> bool {
        env::var(EMBEDDING_MODEL_VAR).is_ok()
    }
}

impl fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
