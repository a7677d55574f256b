//! Test clock — deterministic `Clock` implementation for tests.

use chrono::{DateTime, TimeZone, Utc};
use gauntlet_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The fixed timestamp shared by tests across the workspace.
///
/// # Panics
///
/// Never in practice; the literal date is valid.
#[must_use]
pub fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
}
