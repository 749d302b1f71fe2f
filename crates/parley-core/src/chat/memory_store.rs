//! In-process checkpoint store backed by `DashMap`.
//!
//! State lives for the lifetime of the process. All reads return clones so
//! no `DashMap` guard is ever held across an `.await`.

use std::sync::Arc;

use dashmap::DashMap;

use parley_types::error::RepositoryError;
use parley_types::llm::Message;
use parley_types::session::{Persona, SessionState, ThreadId, ThreadSummary};

use super::checkpoint::CheckpointStore;

/// Cloning produces a shared view of the same threads.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointStore {
    threads: Arc<DashMap<ThreadId, SessionState>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, thread_id: &ThreadId) -> Result<Option<SessionState>, RepositoryError> {
        Ok(self.threads.get(thread_id).map(|r| r.value().clone()))
    }

    async fn append(
        &self,
        thread_id: &ThreadId,
        persona: &Persona,
        messages: &[Message],
    ) -> Result<(), RepositoryError> {
        let mut entry = self
            .threads
            .entry(thread_id.clone())
            .or_insert_with(|| SessionState::new(thread_id.clone(), persona));
        entry.set_persona(persona);
        for message in messages {
            entry.push(message.clone());
        }
        Ok(())
    }

    async fn list_threads(&self) -> Result<Vec<ThreadSummary>, RepositoryError> {
        let mut summaries: Vec<ThreadSummary> = self
            .threads
            .iter()
            .map(|r| {
                let state = r.value();
                ThreadSummary {
                    thread_id: state.thread_id.clone(),
                    personality: state.personality.clone(),
                    language: state.language.clone(),
                    message_count: state.messages.len() as u64,
                    updated_at: state.updated_at,
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}
