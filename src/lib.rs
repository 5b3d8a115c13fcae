// Timed quiz-session engine: per-question countdowns, one shared session
// deadline, durable progress/history, and dashboard reconciliation.
// Screens, navigation, and auth live outside this crate.
pub mod aggregator;
pub mod app_dirs;
pub mod bank;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod progress;
pub mod session;
pub mod store;
pub mod window;

pub use aggregator::{GlobalTick, SessionAggregator, SessionScore};
pub use bank::{BankError, Question, QuestionBank};
pub use clock::{spawn_ticker, Clock, ManualClock, SystemClock, TickerHandle, TICK_INTERVAL};
pub use config::{Config, ConfigStore, FileConfigStore};
pub use engine::{Phase, QuizEngine, QuizSummary, Select, Step};
pub use error::StoreError;
pub use history::{Attempt, HistoryStore, ScoreSnapshot};
pub use progress::ProgressStore;
pub use session::{AnswerSlot, SessionState};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use window::SessionWindow;
