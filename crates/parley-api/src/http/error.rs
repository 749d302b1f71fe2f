//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::{ChatError, ConfigError, RepositoryError};
use parley_types::llm::LlmError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors surfaced by the session façade.
    Chat(ChatError),
    /// A thread that has never received a message.
    ThreadNotFound(String),
    /// Validation error raised before reaching the façade.
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    /// Status, machine-readable code and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::ThreadNotFound(id) => (
                StatusCode::NOT_FOUND,
                "THREAD_NOT_FOUND",
                format!("Thread '{id}' not found"),
            ),
            AppError::Validation(msg) | AppError::Chat(ChatError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(ChatError::Trim(e)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "HISTORY_TOO_LARGE", e.to_string())
            }
            AppError::Chat(ChatError::Llm(e @ LlmError::RateLimited { .. })) => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", e.to_string())
            }
            AppError::Chat(ChatError::Llm(e)) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", e.to_string())
            }
            AppError::Chat(ChatError::Repository(RepositoryError::NotFound)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Not found".to_string())
            }
            AppError::Chat(ChatError::Repository(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", e.to_string())
            }
            AppError::Chat(ChatError::Config(ConfigError::MissingCredential { .. })) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "Model credential is not configured".to_string(),
            ),
            AppError::Chat(ChatError::Config(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        } else {
            tracing::debug!(code, %message, "request rejected");
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": uuid::Uuid::now_v7().to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::error::TrimError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(ChatError::Validation("empty".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::ThreadNotFound("t".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(
                ChatError::Trim(TrimError::LatestMessageExceedsBudget {
                    required: 10,
                    available: 2
                })
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(ChatError::Llm(LlmError::RateLimited { retry_after_ms: None }).into()),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(ChatError::Llm(LlmError::AuthenticationFailed).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ChatError::Repository(RepositoryError::Connection).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_credential_name_not_leaked() {
        let err: AppError = ChatError::Config(ConfigError::MissingCredential {
            env_var: "OPENAI_API_KEY".into(),
        })
        .into();
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "CONFIG_ERROR");
        assert!(!message.contains("OPENAI_API_KEY"));
    }
}
