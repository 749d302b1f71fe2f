//! Terminal output for replies: a thinking spinner until the first
//! fragment arrives, then fragments printed as they stream in.

use std::io::Write;
use std::time::Duration;

use console::style;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

use parley_core::chat::service::ReplyStream;
use parley_types::error::ChatError;

/// A spinner ticking on stderr until cleared.
pub fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Styled speaker prefix, e.g. `Bot:` or `Bot (Spanish):`.
pub fn speaker(label: &str) -> String {
    format!("{}", style(format!("{label}:")).cyan().bold())
}

/// Drain `stream` to stdout after printing `label`, returning the full reply.
///
/// With `spinner` set, a spinner runs until the first fragment. On error
/// the partial line is terminated and the error returned.
pub async fn print_stream(
    mut stream: ReplyStream,
    label: &str,
    spinner: bool,
) -> Result<String, ChatError> {
    let spinner = spinner.then(thinking_spinner);
    let mut reply = String::new();
    let mut started = false;

    while let Some(fragment) = stream.next().await {
        let text = match fragment {
            Ok(text) => text,
            Err(e) => {
                if let Some(spinner) = &spinner {
                    spinner.finish_and_clear();
                }
                if started {
                    println!();
                }
                return Err(e);
            }
        };

        if !started {
            if let Some(spinner) = &spinner {
                spinner.finish_and_clear();
            }
            print!("{} ", speaker(label));
            started = true;
        }
        print!("{text}");
        let _ = std::io::stdout().flush();
        reply.push_str(&text);
    }

    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }
    if !started {
        print!("{} ", speaker(label));
    }
    println!();
    Ok(reply)
}

/// Print a complete reply with its speaker label.
pub fn print_reply(label: &str, content: &str) {
    println!("{} {}", speaker(label), content.trim());
}

/// Print an error in the chat style.
pub fn print_error(context: &str, err: &dyn std::fmt::Display) {
    eprintln!("{} {context}: {err}", style("!").red().bold());
}
