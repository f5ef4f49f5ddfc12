//! SQLite-backed history store.
//!
//! Persists entries in a single `prompt_history` table. The retention
//! policy stays in [`super::HistoryRecorder`]; this store only provides
//! the primitive append/prune/select operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::HistoryError;

use super::{HistoryEntry, HistoryStore};

const CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS prompt_history (
    id TEXT PRIMARY KEY,
    caller_id TEXT NOT NULL,
    prompt_text TEXT NOT NULL,
    specialist TEXT NOT NULL,
    score INTEGER NOT NULL,
    optimized_prompt TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

const CREATE_INDEX: &str = "\
CREATE INDEX IF NOT EXISTS idx_prompt_history_caller_created
    ON prompt_history (caller_id, created_at)";

/// History store over a SQLite connection pool.
pub struct SqliteHistoryStore {
    pool: SqlitePool,
}

impl SqliteHistoryStore {
    /// Connect to a SQLite database and ensure the schema exists.
    ///
    /// Accepts any SQLite connection URL, e.g. `sqlite://history.db` or
    /// `sqlite::memory:`.
    pub async fn connect(url: &str) -> Result<Self, HistoryError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), HistoryError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<HistoryEntry, HistoryError> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| HistoryError::Corrupt(format!("invalid entry id '{}': {}", id, e)))?;
    let score: i64 = row.try_get("score")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(HistoryEntry {
        id,
        caller_id: row.try_get("caller_id")?,
        prompt_text: row.try_get("prompt_text")?,
        specialist: row.try_get("specialist")?,
        score: score.clamp(0, 100) as u32,
        optimized_prompt: row.try_get("optimized_prompt")?,
        created_at,
    })
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        sqlx::query(
            "INSERT INTO prompt_history \
             (id, caller_id, prompt_text, specialist, score, optimized_prompt, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.to_string())
        .bind(&entry.caller_id)
        .bind(&entry.prompt_text)
        .bind(&entry.specialist)
        .bind(entry.score as i64)
        .bind(&entry.optimized_prompt)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn prune_to_cap(&self, caller_id: &str, cap: usize) -> Result<u64, HistoryError> {
        let result = sqlx::query(
            "DELETE FROM prompt_history \
             WHERE caller_id = ? AND id NOT IN ( \
                 SELECT id FROM prompt_history \
                 WHERE caller_id = ? \
                 ORDER BY created_at DESC, rowid DESC \
                 LIMIT ? \
             )",
        )
        .bind(caller_id)
        .bind(caller_id)
        .bind(cap as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn recent(
        &self,
        caller_id: &str,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, HistoryError> {
        let rows = sqlx::query(
            "SELECT id, caller_id, prompt_text, specialist, score, optimized_prompt, created_at \
             FROM prompt_history \
             WHERE caller_id = ? \
             ORDER BY created_at DESC, rowid DESC \
             LIMIT ?",
        )
        .bind(caller_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryRecorder;
    use std::sync::Arc;

    async fn memory_store() -> SqliteHistoryStore {
        SqliteHistoryStore::connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite connects")
    }

    fn entry(caller: &str, prompt: &str) -> HistoryEntry {
        HistoryEntry::new(caller, prompt, "coding", 75, "optimized")
    }

    #[tokio::test]
    async fn test_append_and_recent_roundtrip() {
        let store = memory_store().await;
        let original = entry("caller-1", "sort an array");
        store.append(original.clone()).await.expect("append");

        let recent = store.recent("caller-1", 10).await.expect("recent");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, original.id);
        assert_eq!(recent[0].prompt_text, "sort an array");
        assert_eq!(recent[0].specialist, "coding");
        assert_eq!(recent[0].score, 75);
    }

    #[tokio::test]
    async fn test_prune_removes_oldest_beyond_cap() {
        let store = memory_store().await;
        for i in 0..12 {
            store
                .append(entry("caller-1", &format!("prompt {}", i)))
                .await
                .expect("append");
        }

        let removed = store.prune_to_cap("caller-1", 10).await.expect("prune");
        assert_eq!(removed, 2);

        let recent = store.recent("caller-1", 20).await.expect("recent");
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].prompt_text, "prompt 11");
        assert!(recent.iter().all(|e| e.prompt_text != "prompt 0"));
        assert!(recent.iter().all(|e| e.prompt_text != "prompt 1"));
    }

    #[tokio::test]
    async fn test_prune_ignores_other_callers() {
        let store = memory_store().await;
        for i in 0..3 {
            store
                .append(entry("keep", &format!("k{}", i)))
                .await
                .expect("append");
        }
        store.append(entry("prune", "p0")).await.expect("append");

        store.prune_to_cap("prune", 1).await.expect("prune");
        assert_eq!(store.recent("keep", 10).await.expect("recent").len(), 3);
    }

    #[tokio::test]
    async fn test_recorder_over_sqlite() {
        let store = Arc::new(memory_store().await);
        let recorder = HistoryRecorder::new(Arc::clone(&store) as Arc<dyn HistoryStore>, 10);

        for i in 0..11 {
            recorder
                .record(entry("caller-1", &format!("prompt {}", i)))
                .await
                .expect("record");
        }

        let recent = store.recent("caller-1", 20).await.expect("recent");
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].prompt_text, "prompt 10");
    }
}
