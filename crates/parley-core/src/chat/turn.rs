//! The turn pipeline between loading a thread and calling the model.
//!
//! `TurnProcessor` holds no per-thread data. Each call operates on the
//! `SessionState` passed in, so one processor serves every thread.

use std::sync::Arc;

use parley_types::config::ChatbotConfig;
use parley_types::error::{ConfigError, TrimError};
use parley_types::llm::{CompletionRequest, Message};
use parley_types::session::SessionState;

use crate::llm::token_counter::TokenCounter;

use super::prompt::PromptTemplate;
use super::trimmer::{TrimPolicy, trim_messages};

/// Model parameters copied into every request.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: Option<f64>,
}

pub struct TurnProcessor {
    template: PromptTemplate,
    policy: TrimPolicy,
    counter: Arc<dyn TokenCounter>,
    settings: ModelSettings,
}

impl TurnProcessor {
    pub fn new(
        template: PromptTemplate,
        policy: TrimPolicy,
        counter: Arc<dyn TokenCounter>,
        settings: ModelSettings,
    ) -> Self {
        Self {
            template,
            policy,
            counter,
            settings,
        }
    }

    /// Build from the `[provider]`, `[history]` and `[prompt]` sections.
    pub fn from_config(
        config: &ChatbotConfig,
        counter: Arc<dyn TokenCounter>,
    ) -> Result<Self, ConfigError> {
        let template = PromptTemplate::new(config.prompt.system_template.clone())?;
        let policy = TrimPolicy {
            include_system: config.history.include_system,
            ..TrimPolicy::new(config.history.max_tokens)
        };
        let settings = ModelSettings {
            model: config.provider.model.clone(),
            max_output_tokens: config.provider.max_output_tokens,
            temperature: config.provider.temperature,
        };
        Ok(Self::new(template, policy, counter, settings))
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn policy(&self) -> &TrimPolicy {
        &self.policy
    }

    /// Append the user message to `state` and build the model request:
    /// the persona prompt as the system message, then the trimmed history.
    ///
    /// The user message stays in `state` even if trimming fails.
    pub fn begin_turn(
        &self,
        state: &mut SessionState,
        user_text: &str,
    ) -> Result<CompletionRequest, TrimError> {
        state.push(Message::user(user_text));

        let history = trim_messages(&state.messages, &self.policy, self.counter.as_ref())?;
        tracing::debug!(
            thread_id = %state.thread_id,
            total = state.messages.len(),
            kept = history.len(),
            "trimmed history"
        );

        Ok(CompletionRequest {
            model: self.settings.model.clone(),
            messages: history,
            system: Some(self.template.render(&state.persona())),
            max_tokens: self.settings.max_output_tokens,
            temperature: self.settings.temperature,
            stream: false,
            stop_sequences: None,
        })
    }

    /// Append the assistant's reply to `state` and return it.
    pub fn finish_turn(&self, state: &mut SessionState, reply: impl Into<String>) -> Message {
        let message = Message::assistant(reply);
        state.push(message.clone());
        message
    }
}

impl std::fmt::Debug for TurnProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnProcessor")
            .field("template", &self.template)
            .field("policy", &self.policy)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
