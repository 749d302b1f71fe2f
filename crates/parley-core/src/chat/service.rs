//! Session façade: one call per user turn.
//!
//! `ChatService` owns the provider, checkpoint store and turn processor and
//! drives a turn end to end:
//!
//! 1. validate input, load (or lazily create) the thread
//! 2. persist the user message
//! 3. trim history and render the persona prompt
//! 4. invoke the model (whole reply or fragment stream)
//! 5. persist the assistant reply, only if the model call succeeded and
//!    produced some text
//!
//! Upstream model errors are passed through unchanged. Same-thread callers
//! are not serialized here; different threads never share mutable state.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};

use parley_types::error::ChatError;
use parley_types::llm::{CompletionRequest, LlmError, Message, StopReason, StreamEvent, Usage};
use parley_types::session::{Persona, SessionState, ThreadId, ThreadSummary};

use crate::llm::box_provider::BoxLlmProvider;

use super::checkpoint::CheckpointStore;
use super::turn::TurnProcessor;

/// Lazy, finite, single-use stream of reply fragments.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send + 'static>>;

/// The assistant's answer to one `send` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub thread_id: ThreadId,
    pub content: String,
    pub model: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

pub struct ChatService<S> {
    provider: Arc<BoxLlmProvider>,
    store: Arc<S>,
    processor: Arc<TurnProcessor>,
}

impl<S> Clone for ChatService<S> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            store: Arc::clone(&self.store),
            processor: Arc::clone(&self.processor),
        }
    }
}

impl<S: CheckpointStore + 'static> ChatService<S> {
    pub fn new(provider: BoxLlmProvider, store: S, processor: TurnProcessor) -> Self {
        Self {
            provider: Arc::new(provider),
            store: Arc::new(store),
            processor: Arc::new(processor),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.processor.settings().model
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one turn and return the complete reply.
    pub async fn send(
        &self,
        thread_id: &str,
        message: &str,
        personality: &str,
        language: &str,
    ) -> Result<ChatReply, ChatError> {
        let (thread_id, persona) = validate(thread_id, message, personality, language)?;
        let (mut state, request) = self.prepare(&thread_id, &persona, message).await?;

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = false,
            parley.thread_id = %thread_id,
            parley.history.messages = request.messages.len(),
        );

        let response = self.provider.complete(&request).instrument(span).await?;

        self.commit_reply(&mut state, &persona, &response.content).await?;

        info!(
            thread_id = %thread_id,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "turn complete"
        );

        Ok(ChatReply {
            thread_id,
            content: response.content,
            model: response.model,
            stop_reason: response.stop_reason,
            usage: response.usage,
        })
    }

    /// Run one turn, yielding reply fragments as the model produces them.
    ///
    /// Nothing happens until the stream is first polled. The concatenated
    /// reply is checkpointed once the provider stream ends cleanly; dropping
    /// the stream early or hitting an error commits nothing further.
    pub fn stream(
        &self,
        thread_id: &str,
        message: &str,
        personality: &str,
        language: &str,
    ) -> ReplyStream {
        let this = self.clone();
        let thread_id = thread_id.to_string();
        let message = message.to_string();
        let persona = Persona::new(personality, language);

        Box::pin(async_stream::try_stream! {
            let (thread_id, persona) =
                validate(&thread_id, &message, &persona.personality, &persona.language)?;
            let (mut state, mut request) = this.prepare(&thread_id, &persona, &message).await?;
            request.stream = true;

            let span = info_span!(
                "gen_ai.stream",
                gen_ai.system = this.provider.name(),
                gen_ai.request.model = %request.model,
                gen_ai.request.max_tokens = request.max_tokens,
                gen_ai.request.temperature = ?request.temperature,
                gen_ai.request.stream = true,
                parley.thread_id = %thread_id,
                parley.history.messages = request.messages.len(),
            );
            let mut events = StreamInSpan::new(this.provider.stream(request), span);

            let mut reply = String::new();
            while let Some(event) = events.next().await {
                match event.map_err(ChatError::Llm)? {
                    StreamEvent::TextDelta { text } => {
                        reply.push_str(&text);
                        yield text;
                    }
                    StreamEvent::Usage(usage) => {
                        debug!(
                            input_tokens = usage.input_tokens,
                            output_tokens = usage.output_tokens,
                            "stream usage"
                        );
                    }
                    StreamEvent::MessageDelta { stop_reason } => {
                        debug!(%stop_reason, "stream stop reason");
                    }
                    StreamEvent::Connected | StreamEvent::Done => {}
                }
            }

            this.commit_reply(&mut state, &persona, &reply).await?;
            info!(thread_id = %thread_id, chars = reply.len(), "streamed turn complete");
        })
    }

    /// Current state of a thread, if it exists.
    pub async fn history(&self, thread_id: &str) -> Result<Option<SessionState>, ChatError> {
        let thread_id = ThreadId::new(thread_id).map_err(ChatError::Validation)?;
        Ok(self.store.load(&thread_id).await?)
    }

    pub async fn threads(&self) -> Result<Vec<ThreadSummary>, ChatError> {
        Ok(self.store.list_threads().await?)
    }

    /// Load the thread, persist the user message, and build the request.
    async fn prepare(
        &self,
        thread_id: &ThreadId,
        persona: &Persona,
        message: &str,
    ) -> Result<(SessionState, CompletionRequest), ChatError> {
        let mut state = match self.store.load(thread_id).await? {
            Some(state) => state,
            None => {
                debug!(thread_id = %thread_id, "starting new thread");
                SessionState::new(thread_id.clone(), persona)
            }
        };
        state.set_persona(persona);

        self.store
            .append(thread_id, persona, &[Message::user(message)])
            .await?;

        let request = self.processor.begin_turn(&mut state, message)?;
        Ok((state, request))
    }

    /// Checkpoint the assistant reply. A blank reply is logged and dropped,
    /// so the thread never holds an empty assistant message.
    async fn commit_reply(
        &self,
        state: &mut SessionState,
        persona: &Persona,
        content: &str,
    ) -> Result<(), ChatError> {
        if content.trim().is_empty() {
            warn!(thread_id = %state.thread_id, "model returned an empty reply, not checkpointed");
            return Ok(());
        }
        let reply = self.processor.finish_turn(state, content);
        self.store
            .append(&state.thread_id, persona, std::slice::from_ref(&reply))
            .await?;
        Ok(())
    }
}

fn validate(
    thread_id: &str,
    message: &str,
    personality: &str,
    language: &str,
) -> Result<(ThreadId, Persona), ChatError> {
    let thread_id = ThreadId::new(thread_id).map_err(ChatError::Validation)?;
    if message.trim().is_empty() {
        return Err(ChatError::Validation("message must not be empty".to_string()));
    }
    Ok((thread_id, Persona::new(personality, language)))
}

pin_project_lite::pin_project! {
    /// Keeps a tracing span entered while the inner stream is polled.
    struct StreamInSpan {
        #[pin]
        inner: Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>,
        span: tracing::Span,
    }
}

impl StreamInSpan {
    fn new(
        inner: Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>,
        span: tracing::Span,
    ) -> Self {
        Self { inner, span }
    }
}

impl Stream for StreamInSpan {
    type Item = Result<StreamEvent, LlmError>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        let this = self.project();
        let _enter = this.span.enter();
        this.inner.poll_next(cx)
    }
}
