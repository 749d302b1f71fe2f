//! Conversation session management.
//!
//! A turn flows through these pieces in order: the `ChatService` façade
//! loads the thread from a `CheckpointStore`, the `TurnProcessor` appends the
//! user message, trims history and renders the persona prompt, the provider
//! is invoked, and the reply is appended and checkpointed.

pub mod checkpoint;
pub mod memory_store;
pub mod prompt;
pub mod service;
pub mod trimmer;
pub mod turn;
