use std::io;
use std::rc::Rc;

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::KeyValueStore;

const SCORE_PREFIX: &str = "score/";
const ATTEMPTS_PREFIX: &str = "attempts/";

/// Most recent result per topic, overwritten on every finish. Kept apart
/// from the attempt log so "last known result" reads stay O(1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub score: u32,
    pub total: u32,
}

/// One finished quiz. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub score: u32,
    pub total: u32,
    pub finished_at_millis: i64,
    pub taken_secs: i64,
    pub timed_out: bool,
}

/// Append-only attempt log plus per-topic score snapshots
#[derive(Clone)]
pub struct HistoryStore {
    kv: Rc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(kv: Rc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn save_score(&self, topic: &str, score: u32, total: u32) -> Result<(), StoreError> {
        let blob = serde_json::to_string(&ScoreSnapshot { score, total })?;
        self.kv.put(&score_key(topic), &blob)
    }

    pub fn score(&self, topic: &str) -> Result<Option<ScoreSnapshot>, StoreError> {
        match self.kv.get(&score_key(topic))? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    /// Prepend an attempt; the log stays newest-first.
    pub fn record_attempt(&self, topic: &str, attempt: &Attempt) -> Result<(), StoreError> {
        let mut log = self.attempts(topic)?;
        log.insert(0, attempt.clone());
        let blob = serde_json::to_string(&log)?;
        self.kv.put(&attempts_key(topic), &blob)
    }

    /// Full attempt log for a topic, newest-first.
    pub fn attempts(&self, topic: &str) -> Result<Vec<Attempt>, StoreError> {
        match self.kv.get(&attempts_key(topic))? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(Vec::new()),
        }
    }

    /// The most recent `limit` attempts.
    pub fn recent_attempts(&self, topic: &str, limit: usize) -> Result<Vec<Attempt>, StoreError> {
        let mut log = self.attempts(topic)?;
        log.truncate(limit);
        Ok(log)
    }

    /// Wipe every snapshot and the whole attempt log (the logout path).
    pub fn clear_all(&self) -> Result<(), StoreError> {
        for prefix in [SCORE_PREFIX, ATTEMPTS_PREFIX] {
            for key in self.kv.keys_with_prefix(prefix)? {
                self.kv.remove(&key)?;
            }
        }
        Ok(())
    }

    /// Dump a topic's attempt log as CSV, newest-first, with an RFC 3339
    /// timestamp column.
    pub fn export_csv<W: io::Write>(&self, topic: &str, writer: W) -> Result<(), StoreError> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(["finished_at", "score", "total", "taken_secs", "timed_out"])?;

        for attempt in self.attempts(topic)? {
            let finished_at = Utc
                .timestamp_millis_opt(attempt.finished_at_millis)
                .single()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| attempt.finished_at_millis.to_string());
            out.write_record([
                finished_at,
                attempt.score.to_string(),
                attempt.total.to_string(),
                attempt.taken_secs.to_string(),
                attempt.timed_out.to_string(),
            ])?;
        }

        out.flush()?;
        Ok(())
    }
}

fn score_key(topic: &str) -> String {
    format!("{SCORE_PREFIX}{topic}")
}

fn attempts_key(topic: &str) -> String {
    format!("{ATTEMPTS_PREFIX}{topic}")
}
