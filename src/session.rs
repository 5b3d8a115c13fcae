use serde::{Deserialize, Serialize};

/// One slot per question. Set at most once; later writes are no-ops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSlot {
    /// Not resolved yet
    Empty,
    /// Resolved without an answer (explicit next, or timeout)
    Skipped,
    /// Resolved with the given option index
    Picked(usize),
}

impl AnswerSlot {
    pub fn is_set(&self) -> bool {
        !matches!(self, AnswerSlot::Empty)
    }
}

/// In-flight state for one topic, persisted on every answer and advance so
/// the session survives backgrounding and app kill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_index: usize,
    pub answers: Vec<AnswerSlot>,
    pub remaining_secs: i64,
    pub penalties: u32,
    pub correct_count: u32,
    pub started_at_millis: i64,
    /// Diagnostic only; never drives logic.
    pub last_saved_at_millis: i64,
}

impl SessionState {
    pub fn fresh(bank_len: usize, per_question_secs: i64, now_millis: i64) -> Self {
        Self {
            current_index: 0,
            answers: vec![AnswerSlot::Empty; bank_len],
            remaining_secs: per_question_secs,
            penalties: 0,
            correct_count: 0,
            started_at_millis: now_millis,
            last_saved_at_millis: now_millis,
        }
    }

    /// Clamp a restored record onto the current bank shape. Corrupt or
    /// legacy records are repaired, never rejected.
    pub fn normalized(mut self, bank_len: usize, per_question_secs: i64) -> Self {
        self.answers.resize(bank_len, AnswerSlot::Empty);
        self.current_index = self.current_index.min(bank_len.saturating_sub(1));
        if self.remaining_secs <= 0 {
            self.remaining_secs = per_question_secs;
        }
        self
    }

    /// Final score: correct answers minus timeout penalties, clamped to
    /// `[0, total]`.
    pub fn score(&self, total: u32) -> u32 {
        self.correct_count.saturating_sub(self.penalties).min(total)
    }

    pub fn taken_secs(&self, now_millis: i64) -> i64 {
        (((now_millis - self.started_at_millis) as f64) / 1000.0).round() as i64
    }

    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|slot| slot.is_set()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_shape() {
        let state = SessionState::fresh(20, 12, 1_000);

        assert_eq!(state.current_index, 0);
        assert_eq!(state.answers.len(), 20);
        assert!(state.answers.iter().all(|s| !s.is_set()));
        assert_eq!(state.remaining_secs, 12);
        assert_eq!(state.penalties, 0);
        assert_eq!(state.correct_count, 0);
        assert_eq!(state.started_at_millis, 1_000);
    }

    #[test]
    fn normalized_clamps_index_and_resizes_answers() {
        let mut state = SessionState::fresh(20, 12, 0);
        state.current_index = 99;
        state.answers = vec![AnswerSlot::Picked(1); 3];

        let state = state.normalized(10, 12);

        assert_eq!(state.current_index, 9);
        assert_eq!(state.answers.len(), 10);
        assert_eq!(state.answers[2], AnswerSlot::Picked(1));
        assert_eq!(state.answers[3], AnswerSlot::Empty);
    }

    #[test]
    fn normalized_truncates_long_answers() {
        let mut state = SessionState::fresh(20, 12, 0);
        state.answers = vec![AnswerSlot::Skipped; 30];

        let state = state.normalized(20, 12);
        assert_eq!(state.answers.len(), 20);
    }

    #[test]
    fn normalized_resets_spent_countdown() {
        let mut state = SessionState::fresh(5, 12, 0);
        state.remaining_secs = 0;
        assert_eq!(state.normalized(5, 12).remaining_secs, 12);

        let mut state = SessionState::fresh(5, 12, 0);
        state.remaining_secs = -3;
        assert_eq!(state.normalized(5, 12).remaining_secs, 12);

        let mut state = SessionState::fresh(5, 12, 0);
        state.remaining_secs = 7;
        assert_eq!(state.normalized(5, 12).remaining_secs, 7);
    }

    #[test]
    fn score_is_clamped() {
        let mut state = SessionState::fresh(5, 12, 0);
        state.correct_count = 4;
        state.penalties = 1;
        assert_eq!(state.score(5), 3);

        state.penalties = 9;
        assert_eq!(state.score(5), 0);

        state.correct_count = 40;
        state.penalties = 0;
        assert_eq!(state.score(5), 5);
    }

    #[test]
    fn taken_secs_rounds() {
        let state = SessionState::fresh(5, 12, 10_000);
        assert_eq!(state.taken_secs(14_400), 4);
        assert_eq!(state.taken_secs(14_600), 5);
    }

    #[test]
    fn serde_roundtrip() {
        let mut state = SessionState::fresh(3, 12, 42);
        state.answers[0] = AnswerSlot::Picked(2);
        state.answers[1] = AnswerSlot::Skipped;
        state.current_index = 2;
        state.penalties = 1;
        state.correct_count = 1;

        let blob = serde_json::to_string(&state).unwrap();
        let back: SessionState = serde_json::from_str(&blob).unwrap();
        assert_eq!(back, state);
    }
}
