//! Infrastructure implementations for Parley.
//!
//! Concrete adapters for the ports defined in `parley-core`: the
//! OpenAI-compatible chat provider, the SQLite checkpoint store, plus the
//! config file loader and API key resolution.

pub mod config;
pub mod credentials;
pub mod llm;
pub mod sqlite;
pub mod store;
