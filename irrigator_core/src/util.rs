//! Common time helpers for irrigator_core.

use std::time::Duration;

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;
/// Number of seconds in one minute.
pub const SECS_PER_MIN: u64 = 60;

/// Convert the configured tick period to a `Duration`, clamping to at
/// least 1 ms so a zero config value cannot produce a busy spin.
#[inline]
pub fn tick_period(tick_ms: u64) -> Duration {
    Duration::from_millis(tick_ms.max(1))
}

/// Planned run duration for a schedule of `n` minutes.
#[inline]
pub fn minutes(n: u32) -> Duration {
    Duration::from_secs(u64::from(n) * SECS_PER_MIN)
}
