//! Shared domain types for Parley.
//!
//! Conversation messages, per-thread session state, LLM request/stream
//! shapes, configuration, and the error enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod session;
