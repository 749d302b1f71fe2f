//! Conversation turn logic and port traits for Parley.
//!
//! This crate defines the "ports" (`LlmProvider`, `CheckpointStore`,
//! `TokenCounter`) that the infrastructure layer implements, plus the turn
//! pipeline built on top of them. It depends only on `parley-types` -- never
//! on `parley-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
