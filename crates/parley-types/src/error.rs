use thiserror::Error;

use crate::llm::LlmError;

/// Errors raised while assembling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API key: set the {env_var} environment variable")]
    MissingCredential { env_var: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config file: {0}")]
    Read(String),
}

/// Errors from trimming conversation history to a token budget.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrimError {
    #[error("system message needs {required} tokens but the budget is {budget}")]
    SystemExceedsBudget { required: u32, budget: u32 },

    #[error("latest message needs {required} tokens but only {available} are available")]
    LatestMessageExceedsBudget { required: u32, available: u32 },

    #[error("no message with role '{role}' fits within the budget")]
    NoValidStart { role: String },
}

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Umbrella error for a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("history trimming failed: {0}")]
    Trim(#[from] TrimError),

    /// Upstream model failure, passed through unchanged.
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("checkpoint store error: {0}")]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_names_variable() {
        let err = ConfigError::MissingCredential {
            env_var: "OPENAI_API_KEY".to_string(),
        };
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_llm_error_is_transparent() {
        let err: ChatError = LlmError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "authentication failed");
        assert!(matches!(err, ChatError::Llm(LlmError::AuthenticationFailed)));
    }
}
