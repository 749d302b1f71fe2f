//! Read-only views of the checkpoint store: `parley history` and
//! `parley threads`.
//!
//! These open the store directly, so they work without an API key.

use console::style;

use parley_core::chat::checkpoint::CheckpointStore;
use parley_infra::store::ConfiguredStore;
use parley_types::config::StoreBackend;
use parley_types::llm::MessageRole;
use parley_types::session::{SessionState, ThreadId};

const PREVIEW_CHARS: usize = 100;

/// Print the stored messages of `thread`.
pub async fn show_history(store: &ConfiguredStore, thread: &str, json: bool) -> anyhow::Result<()> {
    let thread_id = ThreadId::new(thread).map_err(|e| anyhow::anyhow!(e))?;
    let session = store.load(&thread_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    match session {
        Some(session) => print_session(&session),
        None => {
            println!("\n  {} No thread named '{}'.", style("?").yellow().bold(), thread);
            hint_memory_backend(store);
            println!();
        }
    }
    Ok(())
}

/// List stored threads, most recently updated first.
pub async fn list_threads(store: &ConfiguredStore, json: bool) -> anyhow::Result<()> {
    let threads = store.list_threads().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&threads)?);
        return Ok(());
    }

    if threads.is_empty() {
        println!("\n  {}", style("No threads yet.").dim());
        hint_memory_backend(store);
        println!();
        return Ok(());
    }

    println!();
    println!(
        "  {:<24} {:<24} {:<12} {:>8}  {}",
        style("THREAD").bold(),
        style("PERSONALITY").bold(),
        style("LANGUAGE").bold(),
        style("MESSAGES").bold(),
        style("UPDATED").bold()
    );
    for summary in &threads {
        println!(
            "  {:<24} {:<24} {:<12} {:>8}  {}",
            style(summary.thread_id.as_str()).cyan(),
            truncate(&summary.personality, 24),
            truncate(&summary.language, 12),
            summary.message_count,
            style(summary.updated_at.format("%Y-%m-%d %H:%M")).dim()
        );
    }
    println!();
    Ok(())
}

/// Print a thread's persona and messages in chat style.
pub fn print_session(session: &SessionState) {
    println!();
    println!(
        "  {} {}  {}",
        style("Thread").bold(),
        style(session.thread_id.as_str()).cyan(),
        style(format!("({}, {})", session.personality, session.language)).dim()
    );
    println!();
    for message in &session.messages {
        let label = match message.role {
            MessageRole::User => style("You").green().bold(),
            MessageRole::Assistant => style("Bot").cyan().bold(),
            MessageRole::System => style("System").dim().bold(),
        };
        println!("  {label}: {}", truncate(&message.content, PREVIEW_CHARS));
    }
    println!();
}

fn hint_memory_backend(store: &ConfiguredStore) {
    if store.backend() == StoreBackend::Memory {
        println!(
            "  {}",
            style("The memory store forgets threads on exit; set [store] backend = \"sqlite\" to keep them.").dim()
        );
    }
}

/// Shorten to `max` characters, marking the cut with "...".
fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let kept: String = single_line.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
