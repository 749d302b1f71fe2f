//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. Global flags adjust output,
//! logging and the handful of config values worth overriding per run.

pub mod chat;
pub mod demo;
pub mod history;
pub mod send;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Thread used when `--thread` is not given.
pub const DEFAULT_THREAD: &str = "demo-conversation";

/// Persona-aware chat sessions over an LLM, with memory per thread.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a config file (defaults to `<data dir>/config.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Override the model name from the config file.
    #[arg(long, global = true, env = "PARLEY_MODEL")]
    pub model: Option<String>,

    /// Override the history token budget from the config file.
    #[arg(long, global = true, env = "PARLEY_HISTORY_TOKENS")]
    pub history_tokens: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Persona and thread flags shared by `chat` and `send`.
#[derive(clap::Args, Debug, Clone)]
pub struct SessionArgs {
    /// Conversation thread to continue (created on first message).
    #[arg(short, long, default_value = DEFAULT_THREAD)]
    pub thread: String,

    /// Personality inserted into the system prompt.
    #[arg(short, long)]
    pub personality: Option<String>,

    /// Language the assistant should answer in.
    #[arg(short, long)]
    pub language: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session.
    Chat {
        #[command(flatten)]
        session: SessionArgs,

        /// Wait for the whole reply instead of streaming tokens.
        #[arg(long)]
        no_stream: bool,
    },

    /// Send a single message and print the reply.
    Send {
        /// The message to send.
        message: String,

        #[command(flatten)]
        session: SessionArgs,

        /// Print tokens as they arrive.
        #[arg(long)]
        stream: bool,
    },

    /// Run the built-in demo conversations.
    Demo {
        /// Which scenario to run.
        #[arg(value_enum, default_value = "all")]
        scenario: DemoScenario,
    },

    /// Show the stored messages of a thread.
    History {
        /// Thread identifier.
        thread: String,
    },

    /// List stored threads, most recently updated first.
    Threads,

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host address to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoScenario {
    /// Name recall across two turns.
    Basic,
    /// Same question answered in English, then Spanish.
    Language,
    /// Two personalities on separate threads.
    Personality,
    /// A streamed poem.
    Streaming,
    /// Every scenario in order.
    All,
}
