use std::rc::Rc;

use crate::error::StoreError;
use crate::session::SessionState;
use crate::store::KeyValueStore;

const SESSION_PREFIX: &str = "session/";
const CORRECT_PREFIX: &str = "correct/";
const DEADLINE_KEY: &str = "session_deadline";

/// Durable in-flight progress, keyed by topic, plus the one deadline all
/// topics share. Concurrent topic engines never talk to each other; they
/// rendezvous here.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Rc<dyn KeyValueStore>,
}

impl ProgressStore {
    pub fn new(kv: Rc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn save(&self, topic: &str, state: &SessionState) -> Result<(), StoreError> {
        let blob = serde_json::to_string(state)?;
        self.kv.put(&session_key(topic), &blob)
    }

    pub fn load(&self, topic: &str) -> Result<Option<SessionState>, StoreError> {
        match self.kv.get(&session_key(topic))? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    pub fn clear(&self, topic: &str) -> Result<(), StoreError> {
        self.kv.remove(&session_key(topic))
    }

    pub fn topics_with_progress(&self) -> Result<Vec<String>, StoreError> {
        let keys = self.kv.keys_with_prefix(SESSION_PREFIX)?;
        Ok(keys
            .into_iter()
            .map(|k| k[SESSION_PREFIX.len()..].to_string())
            .collect())
    }

    /// First caller fixes `now + budget` for every topic; later callers
    /// observe the same value until it is cleared.
    pub fn get_or_create_deadline(
        &self,
        budget_mins: i64,
        now_millis: i64,
    ) -> Result<i64, StoreError> {
        if let Some(existing) = self.deadline()? {
            return Ok(existing);
        }
        let deadline = now_millis + budget_mins * 60_000;
        self.kv.put(DEADLINE_KEY, &deadline.to_string())?;
        Ok(deadline)
    }

    pub fn deadline(&self) -> Result<Option<i64>, StoreError> {
        // An unparseable value counts as no deadline; the next save fixes a
        // fresh one.
        Ok(self
            .kv
            .get(DEADLINE_KEY)?
            .and_then(|raw| raw.parse().ok()))
    }

    pub fn clear_deadline(&self) -> Result<(), StoreError> {
        self.kv.remove(DEADLINE_KEY)
    }

    /// Incremental correct counter, kept apart from the session blob so it
    /// survives a legacy or partial record.
    pub fn bump_correct(&self, topic: &str) -> Result<(), StoreError> {
        let next = self.correct_count(topic)? + 1;
        self.kv.put(&correct_key(topic), &next.to_string())
    }

    pub fn correct_count(&self, topic: &str) -> Result<u32, StoreError> {
        Ok(self
            .kv
            .get(&correct_key(topic))?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0))
    }

    pub fn clear_correct(&self, topic: &str) -> Result<(), StoreError> {
        self.kv.remove(&correct_key(topic))
    }
}

fn session_key(topic: &str) -> String {
    format!("{SESSION_PREFIX}{topic}")
}

fn correct_key(topic: &str) -> String {
    format!("{CORRECT_PREFIX}{topic}")
}
