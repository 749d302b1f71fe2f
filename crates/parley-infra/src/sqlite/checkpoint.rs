//! SQLite checkpoint store.
//!
//! Implements `CheckpointStore` from `parley-core`. A thread is one row in
//! `threads` plus its messages in `thread_messages`, ordered by a per-thread
//! sequence number assigned inside the write transaction.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use parley_core::chat::checkpoint::CheckpointStore;
use parley_types::error::RepositoryError;
use parley_types::llm::{Message, MessageRole};
use parley_types::session::{Persona, SessionState, ThreadId, ThreadSummary};

use super::pool::DatabasePool;

pub struct SqliteCheckpointStore {
    pool: DatabasePool,
}

impl SqliteCheckpointStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ThreadRow {
    thread_id: String,
    personality: String,
    language: String,
    created_at: String,
    updated_at: String,
}

impl ThreadRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            thread_id: row.try_get("thread_id")?,
            personality: row.try_get("personality")?,
            language: row.try_get("language")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_state(self, messages: Vec<Message>) -> Result<SessionState, RepositoryError> {
        Ok(SessionState {
            thread_id: parse_thread_id(self.thread_id)?,
            messages,
            personality: self.personality,
            language: self.language,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    role: String,
    content: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role: row.try_get("role")?,
            content: row.try_get("content")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        Ok(Message::new(role, self.content))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width so that `ORDER BY updated_at` sorts chronologically.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_thread_id(s: String) -> Result<ThreadId, RepositoryError> {
    ThreadId::new(s).map_err(RepositoryError::Query)
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// CheckpointStore implementation
// ---------------------------------------------------------------------------

impl CheckpointStore for SqliteCheckpointStore {
    async fn load(&self, thread_id: &ThreadId) -> Result<Option<SessionState>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM threads WHERE thread_id = ?")
            .bind(thread_id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let thread_row = ThreadRow::from_row(&row).map_err(query_err)?;

        let rows = sqlx::query(
            "SELECT role, content FROM thread_messages WHERE thread_id = ? ORDER BY seq ASC",
        )
        .bind(thread_id.as_str())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            messages.push(MessageRow::from_row(row).map_err(query_err)?.into_message()?);
        }

        Ok(Some(thread_row.into_state(messages)?))
    }

    async fn append(
        &self,
        thread_id: &ThreadId,
        persona: &Persona,
        messages: &[Message],
    ) -> Result<(), RepositoryError> {
        let now = format_datetime(&Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query(
            r#"INSERT INTO threads (thread_id, personality, language, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(thread_id) DO UPDATE SET
                   personality = excluded.personality,
                   language = excluded.language,
                   updated_at = excluded.updated_at"#,
        )
        .bind(thread_id.as_str())
        .bind(&persona.personality)
        .bind(&persona.language)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        let next_seq: i64 = sqlx::query(
            "SELECT COALESCE(MAX(seq) + 1, 0) AS next_seq FROM thread_messages WHERE thread_id = ?",
        )
        .bind(thread_id.as_str())
        .fetch_one(&mut *tx)
        .await
        .and_then(|row| row.try_get("next_seq"))
        .map_err(query_err)?;

        for (offset, message) in messages.iter().enumerate() {
            sqlx::query(
                "INSERT INTO thread_messages (thread_id, seq, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(thread_id.as_str())
            .bind(next_seq + offset as i64)
            .bind(message.role.to_string())
            .bind(&message.content)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        }

        tx.commit().await.map_err(query_err)?;
        tracing::debug!(thread_id = %thread_id, appended = messages.len(), "checkpoint written");
        Ok(())
    }

    async fn list_threads(&self) -> Result<Vec<ThreadSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT t.*, (SELECT COUNT(*) FROM thread_messages m WHERE m.thread_id = t.thread_id) AS message_count
               FROM threads t
               ORDER BY t.updated_at DESC"#,
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_count: i64 = row.try_get("message_count").map_err(query_err)?;
            let thread = ThreadRow::from_row(row).map_err(query_err)?;
            summaries.push(ThreadSummary {
                thread_id: parse_thread_id(thread.thread_id)?,
                personality: thread.personality,
                language: thread.language,
                message_count: message_count as u64,
                updated_at: parse_datetime(&thread.updated_at)?,
            });
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::open_file(&db_path).await.unwrap()
    }

    fn tid(s: &str) -> ThreadId {
        ThreadId::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_thread() {
        let store = SqliteCheckpointStore::new(test_pool().await);
        assert!(store.load(&tid("nobody")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_then_load_preserves_order() {
        let store = SqliteCheckpointStore::new(test_pool().await);
        let id = tid("basic-demo");
        let persona = Persona::default();

        store.append(&id, &persona, &[Message::user("Hi, my name is Alice.")]).await.unwrap();
        store.append(&id, &persona, &[Message::assistant("Hello, Alice!")]).await.unwrap();
        store
            .append(&id, &persona, &[Message::user("Do you remember my name?"), Message::assistant("Alice.")])
            .await
            .unwrap();

        let state = store.load(&id).await.unwrap().unwrap();
        assert_eq!(
            state.messages,
            vec![
                Message::user("Hi, my name is Alice."),
                Message::assistant("Hello, Alice!"),
                Message::user("Do you remember my name?"),
                Message::assistant("Alice."),
            ]
        );
        assert_eq!(state.personality, "friendly");
        assert!(state.updated_at >= state.created_at);
    }

    #[tokio::test]
    async fn test_persona_is_updated() {
        let store = SqliteCheckpointStore::new(test_pool().await);
        let id = tid("language-demo");
        store.append(&id, &Persona::new("professional", "English"), &[Message::user("a")]).await.unwrap();
        store.append(&id, &Persona::new("professional", "Spanish"), &[Message::user("b")]).await.unwrap();

        let state = store.load(&id).await.unwrap().unwrap();
        assert_eq!(state.language, "Spanish");
        assert_eq!(state.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_threads_isolated() {
        let store = SqliteCheckpointStore::new(test_pool().await);
        store.append(&tid("formal-demo"), &Persona::default(), &[Message::user("formal")]).await.unwrap();
        store.append(&tid("humorous-demo"), &Persona::default(), &[Message::user("funny")]).await.unwrap();

        let formal = store.load(&tid("formal-demo")).await.unwrap().unwrap();
        assert_eq!(formal.messages, vec![Message::user("formal")]);
    }

    #[tokio::test]
    async fn test_list_threads_counts_and_orders() {
        let store = SqliteCheckpointStore::new(test_pool().await);
        store.append(&tid("first"), &Persona::default(), &[Message::user("1")]).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .append(&tid("second"), &Persona::new("concise", "English"), &[Message::user("2"), Message::assistant("3")])
            .await
            .unwrap();

        let threads = store.list_threads().await.unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].thread_id.as_str(), "second");
        assert_eq!(threads[0].message_count, 2);
        assert_eq!(threads[0].personality, "concise");
        assert_eq!(threads[1].message_count, 1);
    }

    #[tokio::test]
    async fn test_empty_append_creates_thread() {
        let store = SqliteCheckpointStore::new(test_pool().await);
        store.append(&tid("empty"), &Persona::default(), &[]).await.unwrap();
        let state = store.load(&tid("empty")).await.unwrap().unwrap();
        assert!(state.messages.is_empty());
    }
}
