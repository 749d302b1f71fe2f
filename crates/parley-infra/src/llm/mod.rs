//! LLM provider implementations.
//!
//! Contains the OpenAI-compatible implementation of the [`LlmProvider`]
//! trait defined in `parley-core`, and a factory ([`create_provider`]) that
//! builds it from the `[provider]` config section.
//!
//! [`LlmProvider`]: parley_core::llm::provider::LlmProvider

pub mod openai_compat;

use secrecy::SecretString;

use parley_core::llm::box_provider::BoxLlmProvider;
use parley_types::config::ProviderSettings;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config;

/// Create a [`BoxLlmProvider`] from provider settings and a resolved key.
///
/// An explicit `base_url` wins; otherwise the endpoint is inferred from the
/// provider name, defaulting to OpenAI for names it does not recognise.
pub fn create_provider(settings: &ProviderSettings, api_key: SecretString) -> BoxLlmProvider {
    let model = settings.model.as_str();
    let oai_config = match settings.base_url.as_deref() {
        Some(base_url) => config::custom_defaults(&settings.name, base_url, api_key, model),
        None => match settings.name.as_str() {
            "gemini" => config::gemini_defaults(api_key, model),
            "mistral" => config::mistral_defaults(api_key, model),
            "glm" => config::glm_defaults(api_key, model),
            "openai" => config::openai_defaults(api_key, model),
            other => {
                tracing::warn!(provider = other, "unknown provider name, using OpenAI endpoint");
                config::openai_defaults(api_key, model)
            }
        },
    };

    tracing::debug!(
        provider = %oai_config.provider_name,
        base_url = %oai_config.base_url,
        model = %oai_config.model,
        "creating chat provider"
    );
    BoxLlmProvider::new(OpenAiCompatibleProvider::new(oai_config))
}
