//! Main chat loop orchestration.
//!
//! Reads lines, dispatches slash commands, and runs every other line as a
//! turn on the current thread. A failed turn is reported and the loop keeps
//! going; the user message stays in the checkpoint so the next turn sees it.

use console::style;
use tracing::{debug, warn};

use parley_types::session::Persona;

use crate::cli::history::print_session;
use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::{print_error, print_reply, print_stream, thinking_spinner};

/// Run the interactive chat loop.
pub async fn run_chat_loop(
    state: &AppState,
    thread: String,
    persona: Persona,
    stream: bool,
) -> anyhow::Result<()> {
    let mut thread = thread;
    let mut persona = persona;

    print_welcome_banner(
        &thread,
        &persona,
        state.chat.model(),
        &state.chat.store().backend().to_string(),
    );

    let (mut chat_input, _writer) = ChatInput::new(prompt_for(&thread))
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Goodbye!").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Type 'exit' or press Ctrl+D to quit.").dim());
                continue;
            }
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) => text,
        };

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Clear => chat_input.clear(),
                ChatCommand::Exit => {
                    println!("\n  {}", style("Goodbye!").dim());
                    break;
                }
                ChatCommand::History => match state.chat.history(&thread).await {
                    Ok(Some(session)) => print_session(&session),
                    Ok(None) => println!("\n  {}\n", style("No messages yet.").dim()),
                    Err(e) => print_error("Could not load history", &e),
                },
                ChatCommand::Persona(personality) => {
                    persona.personality = personality;
                    println!("\n  {} personality: {}\n", style("*").cyan().bold(), persona.personality);
                }
                ChatCommand::Language(language) => {
                    persona.language = language;
                    println!("\n  {} language: {}\n", style("*").cyan().bold(), persona.language);
                }
                ChatCommand::Thread(next) => {
                    debug!(from = %thread, to = %next, "switching thread");
                    thread = next;
                    chat_input.update_prompt(&prompt_for(&thread));
                    println!("\n  {} thread: {}\n", style("*").cyan().bold(), thread);
                }
                ChatCommand::Status => {
                    println!();
                    println!("  {}      {}", style("Thread:").bold(), thread);
                    println!("  {} {}", style("Personality:").bold(), persona.personality);
                    println!("  {}    {}", style("Language:").bold(), persona.language);
                    println!("  {}       {}", style("Model:").bold(), state.chat.model());
                    println!();
                }
                ChatCommand::Unknown(what) => {
                    println!(
                        "\n  {} Unknown command: {}. Type /help for available commands.\n",
                        style("?").yellow().bold(),
                        style(what).dim()
                    );
                }
            }
            continue;
        }

        println!();
        let outcome = if stream {
            let fragments =
                state.chat.stream(&thread, &text, &persona.personality, &persona.language);
            print_stream(fragments, "Bot", true).await.map(|_| ())
        } else {
            let spinner = thinking_spinner();
            let result = state
                .chat
                .send(&thread, &text, &persona.personality, &persona.language)
                .await;
            spinner.finish_and_clear();
            result.map(|reply| print_reply("Bot", &reply.content))
        };

        if let Err(e) = outcome {
            warn!(thread_id = %thread, error = %e, "turn failed");
            print_error("Turn failed", &e);
            eprintln!("  {}", style("Type a message to retry, 'exit' to quit.").dim());
        }
        println!();
    }

    Ok(())
}

fn prompt_for(thread: &str) -> String {
    format!("{} {} ", style(format!("[{thread}]")).dim(), style("You:").green().bold())
}
