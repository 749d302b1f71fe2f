//! CheckpointStore trait definition.
//!
//! Durable-ish per-thread state keyed by `ThreadId`. Follows the same RPITIT
//! pattern as the LLM provider trait.

use parley_types::error::RepositoryError;
use parley_types::llm::Message;
use parley_types::session::{Persona, SessionState, ThreadId, ThreadSummary};

/// Persistence port for conversation threads.
///
/// Implementations: `InMemoryCheckpointStore` (this crate) and
/// `SqliteCheckpointStore` (parley-infra).
pub trait CheckpointStore: Send + Sync {
    /// Full state for a thread, or `None` if it has never been written.
    fn load(
        &self,
        thread_id: &ThreadId,
    ) -> impl std::future::Future<Output = Result<Option<SessionState>, RepositoryError>> + Send;

    /// Append `messages` in order, creating the thread if missing and
    /// recording `persona` as the thread's current persona.
    fn append(
        &self,
        thread_id: &ThreadId,
        persona: &Persona,
        messages: &[Message],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Every known thread, most recently updated first.
    fn list_threads(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ThreadSummary>, RepositoryError>> + Send;
}
