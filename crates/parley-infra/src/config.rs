//! Configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` by default) or
//! an explicit path and deserializes it into [`ChatbotConfig`].

use std::path::{Path, PathBuf};

use parley_types::config::ChatbotConfig;
use parley_types::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve the data directory.
///
/// Priority: `PARLEY_DATA_DIR`, then `~/.parley`, then `./.parley`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    PathBuf::from(".parley")
}

/// Load configuration.
///
/// With an explicit path the file must exist and parse. Without one,
/// `{data_dir}/config.toml` is optional: a missing file yields the defaults
/// and a malformed one is logged and ignored.
pub async fn load_config(
    explicit: Option<&Path>,
    data_dir: &Path,
) -> Result<ChatbotConfig, ConfigError> {
    let config = match explicit {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ConfigError::Read(format!("{}: {e}", path.display())))?;
            toml::from_str::<ChatbotConfig>(&content)
                .map_err(|e| ConfigError::Invalid(format!("{}: {e}", path.display())))?
        }
        None => load_default_config(data_dir).await,
    };

    validate_config(&config)?;
    Ok(config)
}

async fn load_default_config(data_dir: &Path) -> ChatbotConfig {
    let config_path = data_dir.join(CONFIG_FILE_NAME);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ChatbotConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ChatbotConfig::default();
        }
    };

    match toml::from_str::<ChatbotConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ChatbotConfig::default()
        }
    }
}

/// Reject values that would make every turn fail.
pub fn validate_config(config: &ChatbotConfig) -> Result<(), ConfigError> {
    if config.history.max_tokens == 0 {
        return Err(ConfigError::Invalid(
            "history.max_tokens must be greater than zero".to_string(),
        ));
    }
    if config.provider.max_output_tokens == 0 {
        return Err(ConfigError::Invalid(
            "provider.max_output_tokens must be greater than zero".to_string(),
        ));
    }
    if config.provider.model.trim().is_empty() {
        return Err(ConfigError::Invalid("provider.model must not be empty".to_string()));
    }
    if let Some(t) = config.provider.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(ConfigError::Invalid(format!(
                "provider.temperature must be within 0.0..=2.0, got {t}"
            )));
        }
    }
    Ok(())
}

/// Default SQLite file location inside the data directory.
pub fn default_database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("parley.db")
}
