// Time Provider Port (for testability)

use chrono::{DateTime, Local, NaiveDate, Utc};

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Current calendar day in the local time zone
    fn today(&self) -> NaiveDate {
        local_date(self.now_millis())
    }
}

/// Calendar day (local time zone) of an epoch-ms timestamp
pub fn local_date(millis: i64) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .with_timezone(&Local)
        .date_naive()
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Frozen clock for deterministic tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeProvider {
    now_millis: i64,
    today: NaiveDate,
}

impl FixedTimeProvider {
    pub fn new(now_millis: i64, today: NaiveDate) -> Self {
        Self { now_millis, today }
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now_millis(&self) -> i64 {
        self.now_millis
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}
