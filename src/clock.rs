use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Interval both the per-question countdown and the session-deadline
/// monitor are driven at.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Source of "now" in epoch milliseconds.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// Production clock reading the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }
}

/// Manually advanced clock for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    millis: Cell<i64>,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            millis: Cell::new(start_millis),
        }
    }

    pub fn advance_millis(&self, delta: i64) {
        self.millis.set(self.millis.get() + delta);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_millis(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.get()
    }
}

/// Cancels the background ticker. Dropping the tick receiver stops it too.
pub struct TickerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TickerHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// Spawns a repeating tick feed; one unit lands on the channel per interval.
///
/// The caller owns the receiver and decides what a tick means (per-question
/// countdown, deadline monitor). A screen tearing down must cancel the
/// handle so no orphaned ticks outlive it.
pub fn spawn_ticker(interval: Duration) -> (TickerHandle, Receiver<()>) {
    let (tx, rx) = mpsc::channel();
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();

    thread::spawn(move || loop {
        thread::sleep(interval);
        if flag.load(Ordering::Relaxed) || tx.send(()).is_err() {
            break;
        }
    });

    (TickerHandle { cancelled }, rx)
}
