//! Run state, health tracking, and the status notification seam.

use irrigator_traits::WallTime;
use std::time::{Duration, Instant};

/// What triggered the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSource {
    Scheduled,
    Manual,
}

/// The single source of truth for whether the relay should be energized.
/// Mutated only by the controller's tick and command-apply paths.
#[derive(Debug, Clone, Copy)]
pub enum RunState {
    Idle,
    Running {
        source: RunSource,
        started_at: Instant,
        planned: Duration,
    },
    /// A stop has been requested (cancel, or run expiry with a failed
    /// relay-off). Resolved at the top of the next tick, before any new
    /// scheduled start is considered.
    CancelRequested,
}

/// RTC availability, tracked purely to debounce status notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockHealth {
    Unknown,
    Available,
    Unavailable,
}

/// Component identifiers for status notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Rtc,
    Relay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Ok,
    Error,
    On,
    Off,
}

/// Receives status notifications, fired only on transition. Implemented by
/// the screen-label painter and similar collaborators outside the core.
pub trait StatusSink {
    fn notify(&mut self, component: Component, status: DeviceStatus);
}

/// Discards all notifications. Builder default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn notify(&mut self, _component: Component, _status: DeviceStatus) {}
}

/// Owned view of the run state for rendering, with wall-time bookkeeping
/// replaced by a remaining duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSnapshot {
    Idle,
    Running {
        source: RunSource,
        remaining: Duration,
    },
    Stopping,
}

/// Read-only view for the configuration page renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub relay_on: bool,
    pub scheduled_start: Option<WallTime>,
    pub scheduled_minutes: u32,
    pub run: RunSnapshot,
}
