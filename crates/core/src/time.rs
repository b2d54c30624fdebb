use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

//
// ─── TIME LIMITS ───────────────────────────────────────────────────────────────
//

/// A quiz or question time budget, authored in whole minutes.
///
/// Zero is a valid limit: the countdown expires immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeLimit(u32);

impl TimeLimit {
    #[must_use]
    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    #[must_use]
    pub fn minutes(self) -> u32 {
        self.0
    }

    /// Budget in seconds, as fed to a countdown.
    #[must_use]
    pub fn as_secs(self) -> i64 {
        i64::from(self.0) * 60
    }

    /// "1 Minute" / "N Minutes".
    #[must_use]
    pub fn label(self) -> String {
        if self.0 == 1 {
            "1 Minute".to_string()
        } else {
            format!("{} Minutes", self.0)
        }
    }
}

/// Formats remaining seconds as `minutes:seconds` with zero-padded seconds.
#[must_use]
pub fn format_remaining(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
