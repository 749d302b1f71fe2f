//! Built-in demo conversations (`parley demo`).
//!
//! Each scenario uses its own thread so runs never see each other's
//! history, except through the store when the sqlite backend is used.

use console::style;

use crate::cli::DemoScenario;
use crate::cli::chat::renderer::{print_reply, print_stream};
use crate::state::AppState;

const BASIC_THREAD: &str = "basic-demo";
const LANGUAGE_THREAD: &str = "language-demo";
const FORMAL_THREAD: &str = "formal-demo";
const HUMOROUS_THREAD: &str = "humorous-demo";
const STREAMING_THREAD: &str = "streaming-demo";

/// Run `scenario` (or all of them in order).
pub async fn run_demo(state: &AppState, scenario: DemoScenario) -> anyhow::Result<()> {
    match scenario {
        DemoScenario::Basic => basic_demo(state).await,
        DemoScenario::Language => language_demo(state).await,
        DemoScenario::Personality => personality_demo(state).await,
        DemoScenario::Streaming => streaming_demo(state).await,
        DemoScenario::All => {
            println!("{}", style("Running chatbot demos...").bold());
            basic_demo(state).await?;
            language_demo(state).await?;
            personality_demo(state).await?;
            streaming_demo(state).await?;
            println!("{}", style("All demos completed!").green().bold());
            Ok(())
        }
    }
}

fn heading(title: &str) {
    println!("\n{}", style(format!("=== {title} ===")).cyan().bold());
}

fn user(text: &str) {
    println!("{} {text}", style("User:").green().bold());
}

/// Name recall: the second turn only works if the first is in the prompt.
async fn basic_demo(state: &AppState) -> anyhow::Result<()> {
    heading("Basic Demo");
    for text in ["Hi, my name is Alice.", "Do you remember my name?"] {
        let reply = state.chat.send(BASIC_THREAD, text, "friendly", "English").await?;
        user(text);
        print_reply("Bot", &reply.content);
        println!();
    }
    Ok(())
}

/// The same question on one thread, first in English, then in Spanish.
async fn language_demo(state: &AppState) -> anyhow::Result<()> {
    heading("Language Demo");
    let question = "Tell me about artificial intelligence.";
    for language in ["English", "Spanish"] {
        let reply = state
            .chat
            .send(LANGUAGE_THREAD, question, "professional", language)
            .await?;
        user(question);
        print_reply(&format!("Bot ({language})"), &reply.content);
        println!();
    }
    Ok(())
}

/// Two personalities on separate threads.
async fn personality_demo(state: &AppState) -> anyhow::Result<()> {
    heading("Personality Demo");
    let question = "Give me a weather forecast.";
    let runs = [
        (FORMAL_THREAD, "formal and professional", "Formal"),
        (HUMOROUS_THREAD, "humorous and witty", "Humorous"),
    ];
    for (thread, personality, label) in runs {
        let reply = state.chat.send(thread, question, personality, "English").await?;
        user(question);
        print_reply(&format!("Bot ({label})"), &reply.content);
        println!();
    }
    Ok(())
}

async fn streaming_demo(state: &AppState) -> anyhow::Result<()> {
    heading("Streaming Demo");
    println!("{}\n", style("(Token-by-token output)").dim());
    let prompt = "Write a short poem about technology.";
    user(prompt);
    let fragments = state.chat.stream(STREAMING_THREAD, prompt, "concise", "English");
    print_stream(fragments, "Bot", false).await?;
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::state_with;

    #[tokio::test]
    async fn test_all_scenarios_use_separate_threads() {
        let state = state_with(vec![]);

        run_demo(&state, DemoScenario::All).await.unwrap();

        let threads = state.chat.threads().await.unwrap();
        let mut names: Vec<&str> = threads.iter().map(|t| t.thread_id.as_str()).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![BASIC_THREAD, FORMAL_THREAD, HUMOROUS_THREAD, LANGUAGE_THREAD, STREAMING_THREAD]
        );

        let language = state.chat.history(LANGUAGE_THREAD).await.unwrap().unwrap();
        assert_eq!(language.messages.len(), 4);
        assert_eq!(language.language, "Spanish");

        let humorous = state.chat.history(HUMOROUS_THREAD).await.unwrap().unwrap();
        assert_eq!(humorous.personality, "humorous and witty");
        assert_eq!(humorous.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_demo_stops_on_upstream_error() {
        let state = state_with(vec![Err("quota exceeded")]);
        assert!(run_demo(&state, DemoScenario::Basic).await.is_err());
    }
}
