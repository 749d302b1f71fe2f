//! Interactive CLI chat.
//!
//! Streams replies behind a thinking spinner and keeps the thread and
//! persona adjustable through slash commands. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
