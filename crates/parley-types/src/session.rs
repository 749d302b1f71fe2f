//! Per-thread conversation state.
//!
//! A thread is an independent conversation addressed by a caller-chosen
//! string key. Its state is the ordered message history plus the persona
//! (personality and reply language) used for the most recent turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::llm::Message;

/// Stable key identifying a conversation thread. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadId(String);

impl ThreadId {
    /// Build a thread id, rejecting empty or whitespace-only keys.
    ///
    /// The key is kept exactly as given: `"alice"` and `" alice"` are
    /// different threads.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("thread id must not be empty".to_string());
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ThreadId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ThreadId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ThreadId> for String {
    fn from(id: ThreadId) -> Self {
        id.0
    }
}

/// Personality and reply language injected into the system prompt.
///
/// Both are free-form and inserted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub personality: String,
    pub language: String,
}

impl Persona {
    pub fn new(personality: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            personality: personality.into(),
            language: language.into(),
        }
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::new("friendly", "English")
    }
}

/// Everything remembered about one thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub thread_id: ThreadId,
    /// Chronological history. Only ever appended to.
    pub messages: Vec<Message>,
    pub personality: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    /// Fresh state for a thread that has never been seen.
    pub fn new(thread_id: ThreadId, persona: &Persona) -> Self {
        let now = Utc::now();
        Self {
            thread_id,
            messages: Vec::new(),
            personality: persona.personality.clone(),
            language: persona.language.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn persona(&self) -> Persona {
        Persona::new(self.personality.clone(), self.language.clone())
    }

    /// Record the persona requested for the current turn.
    pub fn set_persona(&mut self, persona: &Persona) {
        self.personality.clone_from(&persona.personality);
        self.language.clone_from(&persona.language);
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }
}

/// Listing entry for a stored thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub thread_id: ThreadId,
    pub personality: String,
    pub language: String,
    pub message_count: u64,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_rejects_blank() {
        assert!(ThreadId::new("").is_err());
        assert!(ThreadId::new("   ").is_err());
        assert_eq!(ThreadId::new(" basic-demo ").unwrap().as_str(), " basic-demo ");
        assert_ne!(
            ThreadId::new(" basic-demo ").unwrap(),
            ThreadId::new("basic-demo").unwrap()
        );
    }

    #[test]
    fn test_thread_id_serde_validates() {
        let id: ThreadId = serde_json::from_str("\"default\"").unwrap();
        assert_eq!(id.to_string(), "default");
        assert!(serde_json::from_str::<ThreadId>("\"\"").is_err());
    }

    #[test]
    fn test_persona_default() {
        let persona = Persona::default();
        assert_eq!(persona.personality, "friendly");
        assert_eq!(persona.language, "English");
    }

    #[test]
    fn test_session_state_push_and_persona() {
        let id = ThreadId::new("t1").unwrap();
        let mut state = SessionState::new(id.clone(), &Persona::default());
        assert!(state.messages.is_empty());

        state.push(Message::user("hello"));
        state.set_persona(&Persona::new("concise", "Spanish"));

        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.persona(), Persona::new("concise", "Spanish"));
        assert!(state.updated_at >= state.created_at);
        assert_eq!(state.thread_id, id);
    }
}
