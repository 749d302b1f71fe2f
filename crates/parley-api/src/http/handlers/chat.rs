//! Turn endpoints.
//!
//! - POST /api/v1/threads/{thread_id}/messages - send one message, JSON reply
//! - POST /api/v1/threads/{thread_id}/stream   - same turn as SSE
//!
//! SSE event types:
//! - `text_delta` - incremental text: `{ "text": "..." }`
//! - `error` - the turn failed: `{ "code": "...", "message": "..." }`
//! - `done` - stream complete: `{}`
//!
//! Both endpoints hold the thread's lock for the whole turn, so two requests
//! on one thread never interleave their load/append steps.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::Json;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;

use parley_core::chat::service::ChatReply;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for both turn endpoints.
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub message: String,
    /// Defaults to `[prompt].default_personality`.
    pub personality: Option<String>,
    /// Defaults to `[prompt].default_language`.
    pub language: Option<String>,
}

/// POST /api/v1/threads/{thread_id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(body): Json<TurnRequest>,
) -> Result<ApiResponse<ChatReply>, AppError> {
    let start = Instant::now();
    let persona = state.persona(body.personality.as_deref(), body.language.as_deref());

    let lock = state.thread_lock(&thread_id);
    let _guard = lock.lock().await;

    let reply = state
        .chat
        .send(&thread_id, &body.message, &persona.personality, &persona.language)
        .await?;

    Ok(ApiResponse::success(reply, start))
}

/// POST /api/v1/threads/{thread_id}/stream
///
/// Blank input is rejected with a 400 before the stream opens. Failures
/// after that arrive as an `error` event followed by `done`.
pub async fn stream_message(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(body): Json<TurnRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if thread_id.trim().is_empty() {
        return Err(AppError::Validation("thread_id must not be empty".to_string()));
    }
    if body.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    let persona = state.persona(body.personality.as_deref(), body.language.as_deref());
    let lock = state.thread_lock(&thread_id);

    let sse_stream = async_stream::stream! {
        let _guard = lock.lock_owned().await;
        let mut fragments =
            state.chat.stream(&thread_id, &body.message, &persona.personality, &persona.language);

        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(text) => {
                    let data = serde_json::json!({ "text": text });
                    yield Ok::<_, Infallible>(Event::default().event("text_delta").data(data.to_string()));
                }
                Err(e) => {
                    let (_, code, message) = AppError::from(e).parts();
                    tracing::warn!(thread_id = %thread_id, code, %message, "streamed turn failed");
                    let data = serde_json::json!({ "code": code, "message": message });
                    yield Ok(Event::default().event("error").data(data.to_string()));
                    break;
                }
            }
        }

        yield Ok(Event::default().event("done").data("{}"));
    };

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    use crate::state::test_support::state_with;

    fn turn(message: &str, personality: Option<&str>) -> Json<TurnRequest> {
        Json(TurnRequest {
            message: message.to_string(),
            personality: personality.map(str::to_string),
            language: None,
        })
    }

    async fn sse_body(state: AppState, thread: &str, message: &str) -> String {
        let sse = stream_message(State(state), Path(thread.to_string()), turn(message, None))
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(sse.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_send_message_returns_reply_and_checkpoints() {
        let state = state_with(vec![Ok("Hello, Alice!")]);

        let response = send_message(
            State(state.clone()),
            Path("basic-demo".to_string()),
            turn("Hi, my name is Alice.", Some("friendly")),
        )
        .await
        .unwrap();

        let reply = response.data.unwrap();
        assert_eq!(reply.content, "Hello, Alice!");
        assert_eq!(reply.thread_id.as_str(), "basic-demo");

        let history = state.chat.history("basic-demo").await.unwrap().unwrap();
        assert_eq!(history.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_send_message_maps_upstream_failure() {
        let state = state_with(vec![Err("boom")]);
        let err = send_message(State(state), Path("t".to_string()), turn("hi", None))
            .await
            .unwrap_err();
        assert_eq!(err.parts().0, axum::http::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_stream_emits_deltas_then_done() {
        let state = state_with(vec![Ok("Circuits hum softly")]);

        let body = sse_body(state.clone(), "streaming-demo", "Write a short poem about technology.").await;

        assert!(body.contains("event: text_delta"));
        assert!(body.contains(r#"{"text":"Circuits "}"#));
        assert!(body.trim_end().ends_with("data: {}"));
        let history = state.chat.history("streaming-demo").await.unwrap().unwrap();
        assert_eq!(history.messages.last().unwrap().content, "Circuits hum softly");
    }

    #[tokio::test]
    async fn test_stream_failure_is_error_event() {
        let state = state_with(vec![Err("upstream down")]);

        let body = sse_body(state.clone(), "t", "hello").await;

        assert!(body.contains("event: error"));
        assert!(body.contains("UPSTREAM_ERROR"));
        assert!(body.contains("event: done"));
        let history = state.chat.history("t").await.unwrap().unwrap();
        assert_eq!(history.messages.len(), 1, "reply must not be committed");
    }

    #[tokio::test]
    async fn test_stream_rejects_blank_message() {
        let state = state_with(vec![]);
        let result = stream_message(State(state), Path("t".to_string()), turn("   ", None)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
