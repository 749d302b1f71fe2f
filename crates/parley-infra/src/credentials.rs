//! API key resolution.
//!
//! The key is read from the environment variable named in the `[provider]`
//! section (default `OPENAI_API_KEY`) before any provider is built, so a
//! missing credential is reported before any network traffic. The value is
//! wrapped in [`SecretString`] immediately and never logged.

use secrecy::SecretString;

use parley_types::config::ProviderSettings;
use parley_types::error::ConfigError;

/// Resolve the API key from the process environment.
pub fn resolve_api_key(settings: &ProviderSettings) -> Result<SecretString, ConfigError> {
    resolve_api_key_with(settings, |name| std::env::var(name).ok())
}

/// Resolve the API key through `lookup` (the environment in production).
///
/// Blank values count as missing.
pub fn resolve_api_key_with(
    settings: &ProviderSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    match lookup(&settings.api_key_env) {
        Some(value) if !value.trim().is_empty() => {
            tracing::debug!(env_var = %settings.api_key_env, "resolved API key");
            Ok(SecretString::from(value.trim().to_string()))
        }
        _ => Err(ConfigError::MissingCredential {
            env_var: settings.api_key_env.clone(),
        }),
    }
}
