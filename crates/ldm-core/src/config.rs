use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LdmError, Result};

/// Top-level configuration for the modeling assistant.
///
/// Loaded from `~/.ldm/config.toml` by default. Every section falls back to
/// its defaults when omitted, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LdmConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl LdmConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LdmConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| LdmError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognised keys: `LDM_PORT`, `LDM_LLM_API_KEY` (falling back to
    /// `GROQ_API_KEY`), `LDM_LLM_BASE_URL`, `LDM_LLM_MODEL`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("LDM_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid LDM_PORT"),
            }
        }
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_blank("LDM_LLM_API_KEY").or_else(|| non_blank("GROQ_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("LDM_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("LDM_LLM_MODEL") {
            self.llm.model = model;
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Request header carrying the caller's user id.
    pub user_id_header: String,
    /// User id used when the header is absent and not required.
    pub default_user_id: String,
    /// Reject requests that omit the user id header.
    pub require_user_id: bool,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
    /// Global request budget per second.
    pub rate_limit_per_sec: u64,
    /// Maximum request body size in bytes.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            user_id_header: "x-user-id".to_string(),
            default_user_id: "default".to_string(),
            require_user_id: false,
            cors_origins: Vec::new(),
            rate_limit_per_sec: 50,
            body_limit_bytes: 64 * 1024,
        }
    }
}

/// How the model generator asks the backend for structured output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuredOutput {
    /// `response_format: {"type": "json_object"}`; schema lives in the prompt.
    #[default]
    JsonObject,
    /// `response_format: {"type": "json_schema", ...}` with the model schema.
    JsonSchema,
}

/// Language-model backend settings (OpenAI-compatible Chat Completions API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL; `/chat/completions` is appended.
    pub base_url: String,
    /// Bearer credential. Usually supplied through the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Structured output mode for model generation.
    pub structured_output: StructuredOutput,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.2,
            max_tokens: None,
            timeout_secs: 60,
            structured_output: StructuredOutput::JsonObject,
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum accepted query length in characters.
    pub max_query_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_query_chars: 4000,
        }
    }
}
