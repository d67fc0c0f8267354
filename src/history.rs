use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::quiz::Quiz;
use crate::session::{Origin, Session};
use crate::storage::{KeyValueStore, StorageError, HISTORY_KEY};

/// Maximum number of entries kept in the log
pub const HISTORY_LIMIT: usize = 50;

/// Snapshot of a quiz that was taken, keyed by when it was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "quizData")]
    pub quiz: Quiz,
}

/// Bounded, most-recent-first log of past quizzes backed by a [`KeyValueStore`].
///
/// The in-memory log is authoritative: storage failures are logged and
/// never surface to the caller.
#[derive(Debug)]
pub struct HistoryStore<S: KeyValueStore> {
    storage: S,
    entries: Vec<HistoryEntry>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn load(storage: S) -> Self {
        let entries = match storage.get(HISTORY_KEY) {
            Ok(Some(blob)) => decode_entries(&blob),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read history, starting empty");
                Vec::new()
            }
        };
        tracing::debug!(entries = entries.len(), "history loaded");
        Self { storage, entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, timestamp: DateTime<Utc>) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.timestamp == timestamp)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Store a snapshot of `quiz` at the front of the log.
    /// Quizzes re-taken from history are not recorded again.
    pub fn record(&mut self, quiz: &Quiz, origin: Origin) -> Option<DateTime<Utc>> {
        if origin == Origin::History {
            tracing::debug!("quiz came from history, not recording it again");
            return None;
        }

        let mut timestamp = now_millis();
        if let Some(latest) = self.entries.first() {
            if timestamp <= latest.timestamp {
                timestamp = latest.timestamp + chrono::Duration::milliseconds(1);
            }
        }

        self.entries.insert(
            0,
            HistoryEntry {
                timestamp,
                quiz: quiz.clone(),
            },
        );
        self.entries.truncate(HISTORY_LIMIT);
        tracing::info!(title = quiz.display_title(), "quiz recorded in history");
        self.persist();
        Some(timestamp)
    }

    pub fn record_session(&mut self, session: &Session) -> Option<DateTime<Utc>> {
        self.record(session.quiz(), session.origin())
    }

    /// Remove the entry recorded at `timestamp`. Returns false when absent.
    pub fn delete(&mut self, timestamp: DateTime<Utc>) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.timestamp != timestamp);
        let removed = self.entries.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Start a fresh session on an independent copy of the entry's quiz
    pub fn resume(&self, entry: &HistoryEntry) -> Session {
        Session::resumed(Arc::new(entry.quiz.clone()))
    }

    pub fn resume_at(&self, timestamp: DateTime<Utc>) -> Option<Session> {
        self.get(timestamp).map(|entry| self.resume(entry))
    }

    // On failure keep the newer half (at least one entry) and retry once.
    fn persist(&mut self) {
        if let Err(e) = self.write() {
            let keep = (self.entries.len() + 1) / 2;
            tracing::warn!(error = %e, keep, "history write failed, trimming log and retrying");
            self.entries.truncate(keep);
            if let Err(e) = self.write() {
                tracing::error!(error = %e, "history write failed again, keeping it in memory only");
            }
        }
    }

    fn write(&mut self) -> Result<(), StorageError> {
        let blob = serde_json::to_string(&self.entries)?;
        self.storage.set(HISTORY_KEY, &blob)
    }
}

fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::<Utc>::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

fn decode_entries(blob: &str) -> Vec<HistoryEntry> {
    let items = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            tracing::warn!("stored history is not a list, discarding it");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "stored history is unreadable, discarding it");
            return Vec::new();
        }
    };

    let mut entries: Vec<HistoryEntry> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<HistoryEntry>(item) {
            Ok(entry) if !entry.quiz.is_empty() => Some(entry),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable history entry");
                None
            }
        })
        .collect();

    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.dedup_by_key(|e| e.timestamp);
    entries.truncate(HISTORY_LIMIT);
    entries
}
