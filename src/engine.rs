use std::rc::Rc;

use crate::bank::QuestionBank;
use crate::clock::Clock;
use crate::config::Config;
use crate::history::{Attempt, HistoryStore};
use crate::progress::ProgressStore;
use crate::session::{AnswerSlot, SessionState};

/// Engine lifecycle. Input is only accepted while `Active`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Loading,
    Active,
    Finishing,
    Finished,
}

/// Outcome of an answer tap. Selecting reveals correctness but never
/// advances; the caller moves on via [`QuizEngine::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Select {
    /// Slot already set, option out of range, or session not active
    Ignored,
    Revealed { correct: bool },
}

/// Outcome of `advance` or `tick`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    NextQuestion,
    Finished(QuizSummary),
}

/// Emitted once on finish for downstream display
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizSummary {
    pub topic: String,
    pub score: u32,
    pub total: u32,
    pub timed_out: bool,
}

/// Drives one topic's question-by-question flow under two nested timers:
/// the per-question countdown and the deadline shared by all topics.
pub struct QuizEngine {
    bank: QuestionBank,
    config: Config,
    phase: Phase,
    state: SessionState,
    clock: Rc<dyn Clock>,
    progress: ProgressStore,
    history: HistoryStore,
}

impl QuizEngine {
    /// Restore persisted progress for the bank's topic, or start fresh.
    /// A failed or corrupt load falls back to a fresh session.
    pub fn start(
        bank: QuestionBank,
        config: Config,
        clock: Rc<dyn Clock>,
        progress: ProgressStore,
        history: HistoryStore,
    ) -> Self {
        let now = clock.now_millis();
        let state = match progress.load(bank.topic()) {
            Ok(Some(saved)) => {
                let mut state = saved.normalized(bank.len(), config.per_question_secs);
                // The standalone counter outlives records that lost their
                // correct count.
                let counter = progress.correct_count(bank.topic()).unwrap_or(0);
                state.correct_count = state.correct_count.max(counter);
                state
            }
            Ok(None) => SessionState::fresh(bank.len(), config.per_question_secs, now),
            Err(e) => {
                log::warn!("discarding unreadable session for {}: {e}", bank.topic());
                SessionState::fresh(bank.len(), config.per_question_secs, now)
            }
        };

        let mut engine = Self {
            bank,
            config,
            phase: Phase::Active,
            state,
            clock,
            progress,
            history,
        };
        engine.persist();
        engine
    }

    pub fn topic(&self) -> &str {
        self.bank.topic()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn current_question(&self) -> Option<&crate::bank::Question> {
        self.bank.question(self.state.current_index)
    }

    pub fn remaining_secs(&self) -> i64 {
        self.state.remaining_secs
    }

    pub fn session(&self) -> &SessionState {
        &self.state
    }

    /// Record an answer for the current question. Write-once: a second tap
    /// on an already-resolved question changes nothing. Answering stops the
    /// countdown for this question.
    pub fn select(&mut self, option: usize) -> Select {
        if self.phase != Phase::Active {
            return Select::Ignored;
        }
        let idx = self.state.current_index;
        if self.state.answers[idx].is_set() {
            return Select::Ignored;
        }
        let Some(question) = self.bank.question(idx) else {
            return Select::Ignored;
        };
        if option >= question.options.len() {
            return Select::Ignored;
        }

        let correct = question.correct == option;
        self.state.answers[idx] = AnswerSlot::Picked(option);
        if correct {
            self.state.correct_count += 1;
            if let Err(e) = self.progress.bump_correct(self.topic()) {
                log::warn!("failed to bump correct counter for {}: {e}", self.topic());
            }
        }
        self.persist();
        Select::Revealed { correct }
    }

    /// Explicit "Next/Finish". An unresolved slot becomes a skip; unlike a
    /// timeout, an explicit skip carries no penalty.
    pub fn advance(&mut self) -> Step {
        if self.phase != Phase::Active {
            return Step::Continue;
        }
        self.advance_inner(false)
    }

    /// One second elapsed. Runs the timeout-skip path when the countdown
    /// hits zero, and force-finishes when the shared deadline has passed
    /// regardless of per-question state.
    pub fn tick(&mut self) -> Step {
        if self.phase != Phase::Active {
            return Step::Continue;
        }

        match self.progress.deadline() {
            Ok(Some(deadline)) if self.clock.now_millis() >= deadline => {
                return Step::Finished(self.finish(true));
            }
            Err(e) => log::warn!("failed to read session deadline: {e}"),
            _ => {}
        }

        let idx = self.state.current_index;
        if self.state.answers[idx].is_set() {
            // Answered early; the clock idles until the caller advances.
            return Step::Continue;
        }

        self.state.remaining_secs -= 1;
        if self.state.remaining_secs > 0 {
            return Step::Continue;
        }

        self.state.answers[idx] = AnswerSlot::Skipped;
        self.state.penalties += 1;
        self.advance_inner(true)
    }

    /// App backgrounded. Persist and freeze; the next tick resumes as if
    /// nothing happened.
    pub fn suspend(&mut self) {
        if self.phase == Phase::Active {
            self.persist();
        }
    }

    fn advance_inner(&mut self, timed_out: bool) -> Step {
        let idx = self.state.current_index;
        if !self.state.answers[idx].is_set() {
            self.state.answers[idx] = AnswerSlot::Skipped;
        }
        if idx + 1 == self.bank.len() {
            return Step::Finished(self.finish(timed_out));
        }
        self.state.current_index += 1;
        self.state.remaining_secs = self.config.per_question_secs;
        self.persist();
        Step::NextQuestion
    }

    fn finish(&mut self, timed_out: bool) -> QuizSummary {
        self.phase = Phase::Finishing;
        let now = self.clock.now_millis();
        let total = self.bank.len() as u32;
        let score = self.state.score(total);

        if let Err(e) = self.history.save_score(self.topic(), score, total) {
            log::warn!("failed to save score snapshot for {}: {e}", self.topic());
        }
        let attempt = Attempt {
            score,
            total,
            finished_at_millis: now,
            taken_secs: self.state.taken_secs(now),
            timed_out,
        };
        if let Err(e) = self.history.record_attempt(self.topic(), &attempt) {
            log::warn!("failed to record attempt for {}: {e}", self.topic());
        }

        if let Err(e) = self.progress.clear(self.topic()) {
            log::warn!("failed to clear session for {}: {e}", self.topic());
        }
        if let Err(e) = self.progress.clear_correct(self.topic()) {
            log::warn!("failed to clear correct counter for {}: {e}", self.topic());
        }
        // The shared deadline lives exactly as long as some topic has
        // in-flight progress.
        match self.progress.topics_with_progress() {
            Ok(topics) if topics.is_empty() => {
                if let Err(e) = self.progress.clear_deadline() {
                    log::warn!("failed to clear session deadline: {e}");
                }
            }
            Ok(_) => {}
            Err(e) => log::warn!("failed to list in-flight topics: {e}"),
        }

        self.phase = Phase::Finished;
        log::debug!(
            "{}: {} with {score}/{total} (timed_out={timed_out})",
            self.topic(),
            self.phase
        );
        QuizSummary {
            topic: self.topic().to_string(),
            score,
            total,
            timed_out,
        }
    }

    fn persist(&mut self) {
        let now = self.clock.now_millis();
        self.state.last_saved_at_millis = now;
        if let Err(e) = self.progress.save(self.topic(), &self.state) {
            log::warn!("failed to persist session for {}: {e}", self.topic());
        }
        // The first save of any topic fixes the shared deadline.
        if let Err(e) = self
            .progress
            .get_or_create_deadline(self.config.session_budget_mins, now)
        {
            log::warn!("failed to fix session deadline: {e}");
        }
    }
}
