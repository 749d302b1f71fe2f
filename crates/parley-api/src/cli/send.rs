//! One-shot `parley send`.

use parley_types::session::Persona;

use crate::cli::chat::renderer::{print_reply, print_stream};
use crate::state::AppState;

/// Send `message` on `thread` and print the reply.
///
/// With `--json` the full `ChatReply` is printed (streaming is ignored so
/// the output stays one JSON document).
pub async fn send_message(
    state: &AppState,
    thread: &str,
    message: &str,
    persona: &Persona,
    stream: bool,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let reply = state
            .chat
            .send(thread, message, &persona.personality, &persona.language)
            .await?;
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    if stream {
        let fragments = state
            .chat
            .stream(thread, message, &persona.personality, &persona.language);
        print_stream(fragments, "Bot", false).await?;
    } else {
        let reply = state
            .chat
            .send(thread, message, &persona.personality, &persona.language)
            .await?;
        print_reply("Bot", &reply.content);
        tracing::info!(
            model = %reply.model,
            stop_reason = %reply.stop_reason,
            output_tokens = reply.usage.output_tokens,
            "reply received"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::state_with;

    #[tokio::test]
    async fn test_send_then_stream_share_thread() {
        let state = state_with(vec![Ok("Nice to meet you, Alice."), Ok("Your name is Alice.")]);
        let persona = Persona::default();

        send_message(&state, "basic-demo", "Hi, my name is Alice.", &persona, false, false)
            .await
            .unwrap();
        send_message(&state, "basic-demo", "Do you remember my name?", &persona, true, false)
            .await
            .unwrap();

        let session = state.chat.history("basic-demo").await.unwrap().unwrap();
        assert_eq!(session.messages.len(), 4);
        assert_eq!(session.messages[3].content, "Your name is Alice.");
    }

    #[tokio::test]
    async fn test_send_surfaces_validation_error() {
        let state = state_with(vec![]);
        let err = send_message(&state, "t", "  ", &Persona::default(), false, true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("message"));
    }
}
