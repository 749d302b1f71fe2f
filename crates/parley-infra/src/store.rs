//! Checkpoint backend selection.
//!
//! `ConfiguredStore` wraps whichever backend `[store]` names so the façade
//! can be built with a single concrete type.

use std::path::Path;

use parley_core::chat::checkpoint::CheckpointStore;
use parley_core::chat::memory_store::InMemoryCheckpointStore;
use parley_types::config::{StoreBackend, StoreSettings};
use parley_types::error::RepositoryError;
use parley_types::llm::Message;
use parley_types::session::{Persona, SessionState, ThreadId, ThreadSummary};

use crate::config::default_database_path;
use crate::sqlite::checkpoint::SqliteCheckpointStore;
use crate::sqlite::pool::DatabasePool;

pub enum ConfiguredStore {
    Memory(InMemoryCheckpointStore),
    Sqlite(SqliteCheckpointStore),
}

impl ConfiguredStore {
    pub fn backend(&self) -> StoreBackend {
        match self {
            ConfiguredStore::Memory(_) => StoreBackend::Memory,
            ConfiguredStore::Sqlite(_) => StoreBackend::Sqlite,
        }
    }
}

/// Open the configured backend. SQLite files default to `{data_dir}/parley.db`.
pub async fn open_store(
    settings: &StoreSettings,
    data_dir: &Path,
) -> Result<ConfiguredStore, RepositoryError> {
    match settings.backend {
        StoreBackend::Memory => Ok(ConfiguredStore::Memory(InMemoryCheckpointStore::new())),
        StoreBackend::Sqlite => {
            let path = settings
                .path
                .clone()
                .unwrap_or_else(|| default_database_path(data_dir));
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| RepositoryError::Query(format!("{}: {e}", parent.display())))?;
            }
            tracing::debug!(path = %path.display(), "opening sqlite checkpoint store");
            let pool = DatabasePool::open_file(&path).await.map_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "failed to open database");
                RepositoryError::Connection
            })?;
            Ok(ConfiguredStore::Sqlite(SqliteCheckpointStore::new(pool)))
        }
    }
}

impl CheckpointStore for ConfiguredStore {
    async fn load(&self, thread_id: &ThreadId) -> Result<Option<SessionState>, RepositoryError> {
        match self {
            ConfiguredStore::Memory(store) => store.load(thread_id).await,
            ConfiguredStore::Sqlite(store) => store.load(thread_id).await,
        }
    }

    async fn append(
        &self,
        thread_id: &ThreadId,
        persona: &Persona,
        messages: &[Message],
    ) -> Result<(), RepositoryError> {
        match self {
            ConfiguredStore::Memory(store) => store.append(thread_id, persona, messages).await,
            ConfiguredStore::Sqlite(store) => store.append(thread_id, persona, messages).await,
        }
    }

    async fn list_threads(&self) -> Result<Vec<ThreadSummary>, RepositoryError> {
        match self {
            ConfiguredStore::Memory(store) => store.list_threads().await,
            ConfiguredStore::Sqlite(store) => store.list_threads().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(&StoreSettings::default(), tmp.path()).await.unwrap();
        assert_eq!(store.backend(), StoreBackend::Memory);
    }

    #[tokio::test]
    async fn test_sqlite_backend_persists_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = StoreSettings {
            backend: StoreBackend::Sqlite,
            path: Some(tmp.path().join("nested").join("threads.db")),
        };
        let id = ThreadId::new("durable").unwrap();

        {
            let store = open_store(&settings, tmp.path()).await.unwrap();
            assert_eq!(store.backend(), StoreBackend::Sqlite);
            store.append(&id, &Persona::default(), &[Message::user("remember me")]).await.unwrap();
        }

        let reopened = open_store(&settings, tmp.path()).await.unwrap();
        let state = reopened.load(&id).await.unwrap().unwrap();
        assert_eq!(state.messages, vec![Message::user("remember me")]);
    }

    #[tokio::test]
    async fn test_sqlite_default_path_in_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = StoreSettings {
            backend: StoreBackend::Sqlite,
            path: None,
        };
        open_store(&settings, tmp.path()).await.unwrap();
        assert!(tmp.path().join("parley.db").exists());
    }
}
