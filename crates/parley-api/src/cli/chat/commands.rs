//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and adjust the session without sending anything
//! to the model. The bare word `exit` also ends the session.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// Show the stored messages of the current thread.
    History,
    /// Change the personality used from the next turn on.
    Persona(String),
    /// Change the reply language from the next turn on.
    Language(String),
    /// Switch to another thread (created on its first message).
    Thread(String),
    /// Show the current thread, persona and model.
    Status,
    /// Unknown command or missing argument.
    Unknown(String),
}

/// Parse user input as a command.
///
/// Returns `None` for ordinary messages.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        return Some(ChatCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts
        .get(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let with_arg = |build: fn(String) -> ChatCommand, usage: &str| match arg.clone() {
        Some(value) => build(value),
        None => ChatCommand::Unknown(format!("{cmd} requires {usage}")),
    };

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/history" => Some(ChatCommand::History),
        "/status" => Some(ChatCommand::Status),
        "/persona" | "/personality" => Some(with_arg(ChatCommand::Persona, "a personality")),
        "/language" | "/lang" => Some(with_arg(ChatCommand::Language, "a language")),
        "/thread" => Some(with_arg(ChatCommand::Thread, "a thread id")),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Commands").bold().underlined());
    println!();
    let rows = [
        ("/help", "Show this help"),
        ("/history", "Show the messages stored for this thread"),
        ("/persona <text>", "Change the personality"),
        ("/language <text>", "Change the reply language"),
        ("/thread <id>", "Switch to another thread"),
        ("/status", "Show thread, persona and model"),
        ("/clear", "Clear the screen"),
        ("/exit, exit", "End the session (or Ctrl+D)"),
    ];
    for (cmd, desc) in rows {
        println!("  {:<20} {}", style(cmd).cyan(), style(desc).dim());
    }
    println!();
}
