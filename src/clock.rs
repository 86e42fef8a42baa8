use chrono::{DateTime, Duration, Local, NaiveDate};
use std::cell::Cell;

/// Source of wall-clock time for sessions and the statistics store
pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    /// Calendar day in the learner's local timezone
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Production clock backed by the system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to, for tests and replays
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

/// Whole minutes between two instants, rounded half away from zero.
/// Negative spans (clock moved backwards) count as zero.
pub fn elapsed_minutes(start: DateTime<Local>, end: DateTime<Local>) -> u32 {
    let millis = (end - start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis as f64 / 60_000.0).round() as u32
}
