//! Configuration types for Parley.
//!
//! `ChatbotConfig` represents the top-level `config.toml`. Every section and
//! field has a default, so an empty file (or no file at all) yields a working
//! OpenAI-backed chatbot with an in-memory checkpoint store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_SYSTEM_TEMPLATE: &str = "You are a helpful assistant with a {personality} personality. \
Answer all questions to the best of your ability in {language}.";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatbotConfig {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub prompt: PromptSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

/// Which chat-completion endpoint to talk to and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider family ("openai", "gemini", "mistral", "glm"). Selects the
    /// default base URL when `base_url` is unset.
    #[serde(default = "default_provider_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

fn default_provider_name() -> String {
    "openai".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_temperature() -> Option<f64> {
    Some(0.7)
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: None,
            api_key_env: default_api_key_env(),
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// History trimming budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Token budget for the conversation history sent with each turn.
    #[serde(default = "default_history_tokens")]
    pub max_tokens: u32,
    /// Always retain a leading system message when trimming.
    #[serde(default = "default_true")]
    pub include_system: bool,
}

fn default_history_tokens() -> u32 {
    150
}

fn default_true() -> bool {
    true
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_tokens: default_history_tokens(),
            include_system: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSettings {
    #[serde(default = "default_system_template")]
    pub system_template: String,
    #[serde(default = "default_personality")]
    pub default_personality: String,
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_system_template() -> String {
    DEFAULT_SYSTEM_TEMPLATE.to_string()
}

fn default_personality() -> String {
    "friendly".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            system_template: default_system_template(),
            default_personality: default_personality(),
            default_language: default_language(),
        }
    }
}

/// Where thread checkpoints live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-lifetime only.
    #[default]
    Memory,
    Sqlite,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(format!("invalid store backend: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// SQLite database file. Defaults to `<data_dir>/parley.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = ChatbotConfig::default();
        assert_eq!(config.provider.name, "openai");
        assert_eq!(config.provider.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.provider.model, "gpt-3.5-turbo");
        assert_eq!(config.provider.temperature, Some(0.7));
        assert_eq!(config.history.max_tokens, 150);
        assert!(config.history.include_system);
        assert_eq!(config.prompt.default_personality, "friendly");
        assert_eq!(config.prompt.default_language, "English");
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: ChatbotConfig = toml::from_str("").unwrap();
        assert_eq!(config.history.max_tokens, 150);
        assert_eq!(config.prompt.system_template, DEFAULT_SYSTEM_TEMPLATE);
    }

    #[test]
    fn test_config_deserialize_partial_sections() {
        let toml_str = r#"
[provider]
name = "mistral"
model = "mistral-small-latest"

[history]
max_tokens = 400

[store]
backend = "sqlite"
path = "/tmp/parley.db"
"#;
        let config: ChatbotConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.name, "mistral");
        assert_eq!(config.provider.model, "mistral-small-latest");
        assert_eq!(config.provider.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.history.max_tokens, 400);
        assert!(config.history.include_system);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.path, Some(PathBuf::from("/tmp/parley.db")));
    }

    #[test]
    fn test_store_backend_roundtrip() {
        for backend in [StoreBackend::Memory, StoreBackend::Sqlite] {
            let parsed: StoreBackend = backend.to_string().parse().unwrap();
            assert_eq!(parsed, backend);
        }
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
