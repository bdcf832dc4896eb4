//! Test and helper mocks for irrigator_core

use irrigator_config::Schedule;
use irrigator_traits::Clock;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A relay that accepts every command and does nothing; useful for driving
/// the controller when actuation is irrelevant to the test.
#[derive(Debug, Default)]
pub struct NoopRelay;

impl irrigator_traits::Relay for NoopRelay {
    fn on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// In-memory schedule store with whole-record replace semantics.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    schedule: Schedule,
}

impl MemoryStore {
    pub fn new(schedule: Schedule) -> Self {
        Self { schedule }
    }
}

impl crate::store::ScheduleStore for MemoryStore {
    fn load(&mut self) -> Schedule {
        self.schedule
    }

    fn save(&mut self, schedule: &Schedule) -> eyre::Result<()> {
        self.schedule = *schedule;
        Ok(())
    }
}

/// Deterministic clock whose time is advanced manually by the test.
///
/// now() = origin + offset; sleep(d) advances internal time by d without
/// actually sleeping.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
        self.origin + off
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
