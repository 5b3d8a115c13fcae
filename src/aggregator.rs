use std::rc::Rc;

use crate::clock::Clock;
use crate::engine::QuizSummary;
use crate::error::StoreError;
use crate::history::{Attempt, HistoryStore};
use crate::progress::ProgressStore;
use crate::window::SessionWindow;

/// Result of one dashboard tick against the shared deadline
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GlobalTick {
    /// No deadline exists; no topic has begun
    Idle,
    Remaining { secs: i64 },
    /// Deadline passed; these topics were force-finalized
    Expired(Vec<QuizSummary>),
}

/// Per-topic best scores within a credential window, summed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionScore {
    /// `None` for a topic with no qualifying attempt
    pub by_topic: Vec<(String, Option<u32>)>,
    pub total: u32,
}

/// Dashboard-facing reconciliation: one shared deadline versus every topic
/// with live progress. Finalization works from persisted state alone, so
/// topics not currently on screen still settle.
pub struct SessionAggregator {
    clock: Rc<dyn Clock>,
    progress: ProgressStore,
    history: HistoryStore,
}

impl SessionAggregator {
    pub fn new(clock: Rc<dyn Clock>, progress: ProgressStore, history: HistoryStore) -> Self {
        Self {
            clock,
            progress,
            history,
        }
    }

    /// One second elapsed on the dashboard. Reports time remaining; once
    /// the deadline has passed, finalizes every in-flight topic as timed
    /// out and then releases the deadline.
    pub fn tick(&self) -> GlobalTick {
        let deadline = match self.progress.deadline() {
            Ok(Some(deadline)) => deadline,
            Ok(None) => return GlobalTick::Idle,
            Err(e) => {
                log::warn!("failed to read session deadline: {e}");
                return GlobalTick::Idle;
            }
        };

        let now = self.clock.now_millis();
        if now < deadline {
            return GlobalTick::Remaining {
                secs: (deadline - now) / 1000,
            };
        }

        let topics = match self.progress.topics_with_progress() {
            Ok(topics) => topics,
            Err(e) => {
                log::warn!("failed to list in-flight topics: {e}");
                Vec::new()
            }
        };

        let mut finalized = Vec::new();
        for topic in topics {
            match self.finalize_stale(&topic, now) {
                Ok(Some(summary)) => finalized.push(summary),
                // Already settled elsewhere; duplicate finalization is a no-op.
                Ok(None) => {}
                Err(e) => log::warn!("failed to finalize {topic}: {e}"),
            }
        }

        // Released only after the last topic is processed.
        if let Err(e) = self.progress.clear_deadline() {
            log::warn!("failed to clear session deadline: {e}");
        }
        GlobalTick::Expired(finalized)
    }

    fn finalize_stale(&self, topic: &str, now: i64) -> Result<Option<QuizSummary>, StoreError> {
        let Some(mut state) = self.progress.load(topic)? else {
            return Ok(None);
        };
        state.correct_count = state.correct_count.max(self.progress.correct_count(topic)?);

        let total = state.answers.len() as u32;
        let score = state.score(total);
        self.history.save_score(topic, score, total)?;
        self.history.record_attempt(
            topic,
            &Attempt {
                score,
                total,
                finished_at_millis: now,
                taken_secs: state.taken_secs(now),
                timed_out: true,
            },
        )?;

        self.progress.clear(topic)?;
        self.progress.clear_correct(topic)?;
        log::debug!("{topic}: expired with {score}/{total}");
        Ok(Some(QuizSummary {
            topic: topic.to_string(),
            score,
            total,
            timed_out: true,
        }))
    }

    /// Best in-window attempt per topic, summed. Attempts outside the
    /// credential window are ignored entirely; that is what separates the
    /// current session from historical noise without deleting history.
    pub fn session_score(&self, topics: &[&str], window: &SessionWindow) -> SessionScore {
        let mut by_topic = Vec::with_capacity(topics.len());
        let mut total = 0;

        for &topic in topics {
            let attempts = match self.history.attempts(topic) {
                Ok(attempts) => attempts,
                Err(e) => {
                    log::warn!("failed to read attempts for {topic}: {e}");
                    Vec::new()
                }
            };
            let best = attempts
                .iter()
                .filter(|a| window.contains(a.finished_at_millis))
                .map(|a| a.score)
                .max();
            total += best.unwrap_or(0);
            by_topic.push((topic.to_string(), best));
        }

        SessionScore { by_topic, total }
    }

    /// Wipe everything: in-flight sessions, counters, the shared deadline,
    /// snapshots and the attempt log. The logout path.
    pub fn reset_all(&self) -> Result<(), StoreError> {
        for topic in self.progress.topics_with_progress()? {
            self.progress.clear(&topic)?;
            self.progress.clear_correct(&topic)?;
        }
        self.progress.clear_deadline()?;
        self.history.clear_all()
    }
}
