//! LLM provider abstractions for Parley.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: the provider chosen at startup, behind one type
//! - `TokenCounter`: Pluggable token accounting used by history trimming

pub mod box_provider;
pub mod provider;
pub mod token_counter;
