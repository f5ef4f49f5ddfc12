//! Optimization history and its retention policy.
//!
//! Storage itself is a collaborator behind the [`HistoryStore`] trait; the
//! policy is owned here: each successful, non-errored run for an
//! identified caller is appended, texts are truncated to their storage
//! bounds, and immediately after an append the caller's entries are pruned
//! to the most recent [`DEFAULT_HISTORY_CAP`] by creation time. The
//! entries are reference data, not recomputable artifacts; pruning
//! deletes the caller's own least-recent records.

pub mod database;

pub use database::SqliteHistoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::HistoryError;

/// Default number of entries retained per caller.
pub const DEFAULT_HISTORY_CAP: usize = 10;

/// Maximum stored prompt length, in characters.
pub const MAX_STORED_PROMPT_CHARS: usize = 1_000;

/// Maximum stored optimized-prompt length, in characters.
pub const MAX_STORED_OPTIMIZED_CHARS: usize = 2_000;

/// One persisted optimization record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry id.
    pub id: Uuid,
    /// The caller this entry belongs to.
    pub caller_id: String,
    /// The original prompt, truncated to [`MAX_STORED_PROMPT_CHARS`].
    pub prompt_text: String,
    /// Identifier of the specialist that handled the request.
    pub specialist: String,
    /// Total score in [0, 100].
    pub score: u32,
    /// The rewritten prompt, truncated to [`MAX_STORED_OPTIMIZED_CHARS`].
    pub optimized_prompt: String,
    /// Creation timestamp; orders entries for pruning.
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Build a new entry, applying the storage truncation bounds.
    pub fn new(
        caller_id: impl Into<String>,
        prompt_text: &str,
        specialist: impl Into<String>,
        score: u32,
        optimized_prompt: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            caller_id: caller_id.into(),
            prompt_text: truncate_chars(prompt_text, MAX_STORED_PROMPT_CHARS),
            specialist: specialist.into(),
            score,
            optimized_prompt: truncate_chars(optimized_prompt, MAX_STORED_OPTIMIZED_CHARS),
            created_at: Utc::now(),
        }
    }
}

/// Truncate a string to at most `max` characters.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Storage collaborator for history entries.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError>;

    /// Delete all but the `cap` most-recently-created entries for a
    /// caller. Returns the number of deleted entries.
    async fn prune_to_cap(&self, caller_id: &str, cap: usize) -> Result<u64, HistoryError>;

    /// The caller's most recent entries, newest first.
    async fn recent(&self, caller_id: &str, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError>;
}

/// Applies the retention policy on top of a [`HistoryStore`].
pub struct HistoryRecorder {
    store: Arc<dyn HistoryStore>,
    cap: usize,
}

impl HistoryRecorder {
    /// Build a recorder enforcing the given cap.
    pub fn new(store: Arc<dyn HistoryStore>, cap: usize) -> Self {
        Self { store, cap }
    }

    /// The enforced cap.
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Append an entry, then prune the caller's records beyond the cap.
    pub async fn record(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let caller_id = entry.caller_id.clone();
        self.store.append(entry).await?;

        let removed = self.store.prune_to_cap(&caller_id, self.cap).await?;
        if removed > 0 {
            tracing::debug!(removed, caller = %caller_id, "pruned history entries beyond cap");
        }
        Ok(())
    }
}

/// In-memory store, used in tests and as a no-persistence default.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Positions of a caller's entries ranked newest first. Ties on
    /// `created_at` rank later appends as newer.
    fn ranked_positions(entries: &[HistoryEntry], caller_id: &str) -> Vec<usize> {
        let mut positions: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.caller_id == caller_id)
            .map(|(pos, _)| pos)
            .collect();
        positions.sort_by(|a, b| {
            entries[*b]
                .created_at
                .cmp(&entries[*a].created_at)
                .then(b.cmp(a))
        });
        positions
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.entries.lock().expect("lock not poisoned").push(entry);
        Ok(())
    }

    async fn prune_to_cap(&self, caller_id: &str, cap: usize) -> Result<u64, HistoryError> {
        let mut entries = self.entries.lock().expect("lock not poisoned");
        let ranked = Self::ranked_positions(&entries, caller_id);
        if ranked.len() <= cap {
            return Ok(0);
        }

        let mut stale: Vec<usize> = ranked[cap..].to_vec();
        stale.sort_unstable_by(|a, b| b.cmp(a));
        for pos in &stale {
            entries.remove(*pos);
        }
        Ok(stale.len() as u64)
    }

    async fn recent(
        &self,
        caller_id: &str,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, HistoryError> {
        let entries = self.entries.lock().expect("lock not poisoned");
        Ok(Self::ranked_positions(&entries, caller_id)
            .into_iter()
            .take(limit)
            .map(|pos| entries[pos].clone())
            .collect())
    }
}
