//! Welcome banner display for chat sessions.

use console::style;

use parley_types::session::Persona;

/// Print the banner shown when an interactive session starts.
pub fn print_welcome_banner(thread: &str, persona: &Persona, model: &str, store: &str) {
    println!();
    println!("  {}", style("Parley").cyan().bold());
    println!(
        "  {}",
        style(format!("A {} assistant answering in {}", persona.personality, persona.language)).dim()
    );
    println!();
    println!("  {}   {}", style("Model:").bold(), style(model).dim());
    println!("  {}  {}", style("Thread:").bold(), style(thread).dim());
    println!("  {}   {}", style("Store:").bold(), style(store).dim());
    println!();
    println!(
        "  {}",
        style("Type /help for commands, 'exit' or Ctrl+D to quit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
