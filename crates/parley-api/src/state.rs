//! Application state shared across CLI commands and HTTP handlers.
//!
//! Holds the session façade (provider, checkpoint store, turn processor),
//! the resolved configuration and the per-thread locks used by the HTTP
//! layer to serialize same-thread requests.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use secrecy::SecretString;
use tokio::sync::Mutex;

use parley_core::chat::service::ChatService;
use parley_core::chat::turn::TurnProcessor;
use parley_core::llm::box_provider::BoxLlmProvider;
use parley_core::llm::token_counter::ApproxTokenCounter;
use parley_infra::credentials::resolve_api_key;
use parley_infra::llm::create_provider;
use parley_infra::store::{ConfiguredStore, open_store};
use parley_types::config::ChatbotConfig;
use parley_types::error::ConfigError;
use parley_types::session::Persona;

/// How to react when the configured API key variable is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrompt {
    /// Ask on the terminal (hidden input) when a user is attached.
    IfInteractive,
    /// Fail with `ConfigError::MissingCredential`.
    Never,
}

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub chat: ChatService<ConfiguredStore>,
    pub config: Arc<ChatbotConfig>,
    pub data_dir: PathBuf,
    thread_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl AppState {
    /// Build the provider, open the checkpoint store and wire the façade.
    ///
    /// The API key is resolved before anything else so a missing credential
    /// is reported without touching the network or the store.
    pub async fn init(
        config: ChatbotConfig,
        data_dir: PathBuf,
        prompt: KeyPrompt,
    ) -> anyhow::Result<Self> {
        let api_key = obtain_api_key(&config, prompt)?;
        let provider = create_provider(&config.provider, api_key);
        let store = open_store(&config.store, &data_dir).await?;
        Self::from_parts(provider, store, config, data_dir)
    }

    /// Wire a state around an already-built provider and store.
    pub fn from_parts(
        provider: BoxLlmProvider,
        store: ConfiguredStore,
        config: ChatbotConfig,
        data_dir: PathBuf,
    ) -> anyhow::Result<Self> {
        let processor =
            TurnProcessor::from_config(&config, Arc::new(ApproxTokenCounter::default()))?;
        tracing::info!(
            provider = provider.name(),
            model = %config.provider.model,
            store = %store.backend(),
            history_tokens = config.history.max_tokens,
            "session service ready"
        );

        Ok(Self {
            chat: ChatService::new(provider, store, processor),
            config: Arc::new(config),
            data_dir,
            thread_locks: Arc::new(DashMap::new()),
        })
    }

    /// Persona from `[prompt]`, overridden field by field.
    pub fn persona(&self, personality: Option<&str>, language: Option<&str>) -> Persona {
        Persona::new(
            personality.unwrap_or(&self.config.prompt.default_personality),
            language.unwrap_or(&self.config.prompt.default_language),
        )
    }

    /// The lock guarding turns on `thread_id`, created on first use.
    ///
    /// Keyed by the exact thread id. Entries are never evicted: the map holds
    /// one lock per thread seen by this process, as the store holds one
    /// checkpoint per thread.
    pub fn thread_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        self.thread_locks
            .entry(thread_id.to_string())
            .or_default()
            .clone()
    }
}

fn obtain_api_key(config: &ChatbotConfig, prompt: KeyPrompt) -> anyhow::Result<SecretString> {
    match resolve_api_key(&config.provider) {
        Ok(key) => Ok(key),
        Err(ConfigError::MissingCredential { env_var })
            if prompt == KeyPrompt::IfInteractive && console::user_attended() =>
        {
            let value: String = dialoguer::Password::new()
                .with_prompt(format!("Enter your API key ({env_var})"))
                .interact()?;
            let value = value.trim().to_string();
            if value.is_empty() {
                return Err(ConfigError::MissingCredential { env_var }.into());
            }
            Ok(SecretString::from(value))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::pin::Pin;
    use std::sync::Mutex as StdMutex;

    use futures_util::Stream;

    use parley_core::chat::memory_store::InMemoryCheckpointStore;
    use parley_core::llm::provider::LlmProvider;
    use parley_types::llm::{
        CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason,
        StreamEvent, Usage,
    };

    use super::*;

    static CAPS: ProviderCapabilities = ProviderCapabilities {
        streaming: true,
        max_context_tokens: 16_385,
        max_output_tokens: 4_096,
    };

    /// Replies from a script; an `Err` entry fails that call.
    pub struct CannedProvider {
        replies: StdMutex<VecDeque<Result<String, String>>>,
    }

    impl CannedProvider {
        pub fn new(replies: Vec<Result<&str, &str>>) -> Self {
            Self {
                replies: StdMutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
            }
        }

        fn next(&self) -> Result<String, LlmError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("ok".to_string()))
                .map_err(|message| LlmError::Provider { message })
        }
    }

    impl LlmProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        fn capabilities(&self) -> &ProviderCapabilities {
            &CAPS
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                id: "resp-1".to_string(),
                content: self.next()?,
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage {
                    input_tokens: 10,
                    output_tokens: 5,
                },
            })
        }

        fn stream(
            &self,
            _request: CompletionRequest,
        ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
            let next = self.next();
            Box::pin(async_stream::try_stream! {
                let text = next?;
                yield StreamEvent::Connected;
                for word in text.split_inclusive(' ') {
                    yield StreamEvent::TextDelta { text: word.to_string() };
                }
                yield StreamEvent::Done;
            })
        }
    }

    pub fn state_with(replies: Vec<Result<&str, &str>>) -> AppState {
        AppState::from_parts(
            BoxLlmProvider::new(CannedProvider::new(replies)),
            ConfiguredStore::Memory(InMemoryCheckpointStore::new()),
            ChatbotConfig::default(),
            PathBuf::from("."),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::state_with;
    use super::*;

    #[test]
    fn test_persona_falls_back_to_config_defaults() {
        let state = state_with(vec![]);
        assert_eq!(state.persona(None, None), Persona::new("friendly", "English"));
        assert_eq!(
            state.persona(Some("humorous and witty"), None),
            Persona::new("humorous and witty", "English")
        );
    }

    #[test]
    fn test_thread_lock_shared_per_thread() {
        let state = state_with(vec![]);
        let a = state.thread_lock("alpha");
        let again = state.thread_lock("alpha");
        let padded = state.thread_lock(" alpha ");
        let b = state.thread_lock("beta");
        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &padded));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_missing_key_without_prompt_fails() {
        let mut config = ChatbotConfig::default();
        config.provider.api_key_env = "PARLEY_API_TEST_UNSET_KEY".to_string();
        let err = obtain_api_key(&config, KeyPrompt::Never).unwrap_err();
        let err = err.downcast::<ConfigError>().unwrap();
        assert!(matches!(err, ConfigError::MissingCredential { ref env_var } if env_var == "PARLEY_API_TEST_UNSET_KEY"));
    }

    #[tokio::test]
    async fn test_init_reports_missing_key_before_opening_store() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = ChatbotConfig::default();
        config.provider.api_key_env = "PARLEY_API_TEST_UNSET_KEY".to_string();
        config.store.backend = parley_types::config::StoreBackend::Sqlite;

        let result = AppState::init(config, tmp.path().to_path_buf(), KeyPrompt::Never).await;

        assert!(result.is_err());
        assert!(!tmp.path().join("parley.db").exists());
    }
}
