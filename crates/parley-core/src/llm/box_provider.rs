//! Runtime-selected chat model behind one concrete type.
//!
//! `ChatService` holds a `BoxLlmProvider` so the binary can pick the
//! OpenAI-compatible family from config while tests hand in scripted
//! providers, without making the façade generic over the provider.

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;

use parley_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StreamEvent,
};

use super::provider::LlmProvider;

type ReplyFuture<'a> = Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;
type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// `LlmProvider` with the `complete` future boxed so it can sit behind `dyn`.
trait ErasedProvider: Send + Sync {
    fn name(&self) -> &str;
    fn capabilities(&self) -> &ProviderCapabilities;
    fn complete<'a>(&'a self, request: &'a CompletionRequest) -> ReplyFuture<'a>;
    fn stream(&self, request: CompletionRequest) -> EventStream;
}

impl<P: LlmProvider> ErasedProvider for P {
    fn name(&self) -> &str {
        LlmProvider::name(self)
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        LlmProvider::capabilities(self)
    }

    fn complete<'a>(&'a self, request: &'a CompletionRequest) -> ReplyFuture<'a> {
        Box::pin(LlmProvider::complete(self, request))
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        LlmProvider::stream(self, request)
    }
}

/// The provider a `ChatService` talks to, chosen at startup.
pub struct BoxLlmProvider {
    inner: Box<dyn ErasedProvider>,
}

impl BoxLlmProvider {
    pub fn new<P: LlmProvider + 'static>(provider: P) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    /// Provider family, recorded as `gen_ai.system` on turn spans.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn capabilities(&self) -> &ProviderCapabilities {
        self.inner.capabilities()
    }

    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.inner.complete(request).await
    }

    pub fn stream(&self, request: CompletionRequest) -> EventStream {
        self.inner.stream(request)
    }
}

impl std::fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxLlmProvider")
            .field("name", &self.name())
            .field("streaming", &self.capabilities().streaming)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use parley_types::llm::{Message, StopReason, Usage};

    struct EchoProvider;

    static CAPS: ProviderCapabilities = ProviderCapabilities {
        streaming: false,
        max_context_tokens: 2_048,
        max_output_tokens: 256,
    };

    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn capabilities(&self) -> &ProviderCapabilities {
            &CAPS
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(CompletionResponse {
                id: "echo-1".to_string(),
                content: last,
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }

        fn stream(&self, _request: CompletionRequest) -> EventStream {
            Box::pin(futures_util::stream::iter(vec![Err(LlmError::Stream(
                "echo does not stream".to_string(),
            ))]))
        }
    }

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest {
            model: "echo-model".to_string(),
            messages: vec![Message::user(text)],
            system: None,
            max_tokens: 16,
            temperature: None,
            stream: false,
            stop_sequences: None,
        }
    }

    #[tokio::test]
    async fn test_boxed_provider_delegates() {
        let provider = BoxLlmProvider::new(EchoProvider);
        assert_eq!(provider.name(), "echo");
        assert_eq!(provider.capabilities().max_output_tokens, 256);

        let response = provider.complete(&request("ping")).await.unwrap();
        assert_eq!(response.content, "ping");
        assert_eq!(response.model, "echo-model");

        let mut events = provider.stream(request("ping"));
        assert!(matches!(
            events.next().await,
            Some(Err(LlmError::Stream(ref message))) if message == "echo does not stream"
        ));
        assert!(events.next().await.is_none());
    }

    #[test]
    fn test_debug_shows_provider_name() {
        let debug = format!("{:?}", BoxLlmProvider::new(EchoProvider));
        assert!(debug.contains("echo"));
        assert!(debug.contains("streaming: false"));
    }
}
