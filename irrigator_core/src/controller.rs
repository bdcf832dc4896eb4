//! The scheduled actuator controller (`Controller`).
//!
//! Reconciles the persisted schedule, the RTC reading, and queued manual
//! overrides into relay commands and debounced status notifications, once
//! per tick. All run-state mutation happens here, on the controller thread;
//! commands are the only cross-thread artifact.

use std::sync::Arc;
use std::time::Duration;

use irrigator_config::Schedule;
use irrigator_traits::clock::{Clock, MonotonicClock};
use irrigator_traits::{Relay, WallTime};

use crate::command::Command;
use crate::error::BuildError;
use crate::hw_error::map_hw_error;
use crate::intake::{CommandDrain, CommandIntake, command_channel};
use crate::status::{
    ClockHealth, Component, DeviceStatus, NullSink, RunSnapshot, RunSource, RunState, Snapshot,
    StatusSink,
};
use crate::store::ScheduleStore;
use crate::util::minutes;

pub struct Controller<R: Relay, S: ScheduleStore> {
    pub(crate) relay: R,
    pub(crate) store: S,
    pub(crate) sink: Box<dyn StatusSink + Send>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) drain: CommandDrain,
    pub(crate) intake: CommandIntake,
    pub(crate) test_duration: Duration,

    pub(crate) run_state: RunState,
    pub(crate) clock_health: ClockHealth,
    pub(crate) schedule: Schedule,
    pub(crate) relay_on: bool,
    pub(crate) relay_reported: Option<DeviceStatus>,
}

impl<R: Relay, S: ScheduleStore> core::fmt::Debug for Controller<R, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("run_state", &self.run_state)
            .field("clock_health", &self.clock_health)
            .field("relay_on", &self.relay_on)
            .finish()
    }
}

impl<R: Relay, S: ScheduleStore> Controller<R, S> {
    pub fn builder() -> ControllerBuilder<R, S> {
        ControllerBuilder::new()
    }

    /// Producer handle for the request-handling side. Cheap to clone; never
    /// blocks on the controller thread.
    pub fn intake(&self) -> CommandIntake {
        self.intake.clone()
    }

    /// One scheduling evaluation. Called once per period by the runner.
    ///
    /// Order matters: queued commands are applied first so a cancel always
    /// resolves before a coincident scheduled start is considered.
    pub fn tick(&mut self, now: Option<WallTime>) {
        // 1. Drain pending commands in arrival order.
        while let Some(cmd) = self.drain.try_next() {
            self.apply_command(cmd);
        }

        // 2. Re-read the schedule so externally edited records are honored
        //    without a restart.
        self.schedule = self.store.load();

        self.update_clock_health(now.is_some());

        // 3. A requested stop takes priority over everything else, including
        //    a scheduled start landing in this same tick.
        if matches!(self.run_state, RunState::CancelRequested) {
            self.finish_stop();
            return;
        }

        match self.run_state {
            RunState::Idle => {
                // Pulse match: exact hour:minute, once per minute boundary.
                // A missed tick skips that day's run; accepted behavior.
                if let Some(now) = now
                    && self.schedule.is_enabled()
                    && self.schedule.start_time == Some(now)
                {
                    self.start_run(RunSource::Scheduled, minutes(self.schedule.duration_minutes));
                }
            }
            RunState::Running {
                started_at, planned, ..
            } => {
                if self.clock.since(started_at) >= planned {
                    self.finish_stop();
                } else {
                    self.reassert_on();
                }
            }
            RunState::CancelRequested => {}
        }
    }

    /// Read-only view for rendering by the configuration page.
    pub fn snapshot(&self) -> Snapshot {
        let run = match self.run_state {
            RunState::Idle => RunSnapshot::Idle,
            RunState::Running {
                source,
                started_at,
                planned,
            } => RunSnapshot::Running {
                source,
                remaining: planned.saturating_sub(self.clock.since(started_at)),
            },
            RunState::CancelRequested => RunSnapshot::Stopping,
        };
        Snapshot {
            relay_on: self.relay_on,
            scheduled_start: self.schedule.start_time,
            scheduled_minutes: self.schedule.duration_minutes,
            run,
        }
    }

    /// Fail-safe: force the relay off before process exit, retrying up to
    /// `max_attempts` times. Relay-off is the one direction never silently
    /// abandoned.
    pub fn make_safe(&mut self, max_attempts: u32) -> crate::error::Result<()> {
        for attempt in 1..=max_attempts.max(1) {
            match self.relay.off() {
                Ok(()) => {
                    self.relay_on = false;
                    self.notify_relay(DeviceStatus::Off);
                    self.run_state = RunState::Idle;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %map_hw_error(&*e), "fail-safe relay off failed");
                }
            }
        }
        Err(eyre::Report::new(crate::error::ControllerError::DriverFault(
            "relay off not confirmed during shutdown".into(),
        )))
    }

    // ── Private: command application and relay transitions ──────────────────

    fn apply_command(&mut self, cmd: Command) {
        match cmd {
            Command::TurnOff => {
                tracing::info!("turn-off command");
                self.persist(Schedule::disabled());
                if matches!(self.run_state, RunState::Running { .. }) {
                    // Actual relay-off happens at the top of this tick's
                    // evaluation, so it is applied exactly once and never
                    // races a concurrent scheduled-start match.
                    self.run_state = RunState::CancelRequested;
                }
            }
            Command::RunTest => {
                if matches!(self.run_state, RunState::Idle) {
                    tracing::info!(secs = self.test_duration.as_secs(), "test run command");
                    self.start_run(RunSource::Manual, self.test_duration);
                } else {
                    // A test cannot interrupt an in-progress run.
                    tracing::debug!("test run ignored; controller not idle");
                }
            }
            Command::SetSchedule(s) => {
                tracing::info!(
                    start = %s.start_time.map(|t| t.to_string()).unwrap_or_default(),
                    minutes = s.duration_minutes,
                    "schedule updated"
                );
                // Takes effect for future scheduling decisions only; a run
                // in progress keeps its original planned duration.
                self.persist(s);
            }
        }
    }

    /// Persist a schedule mutation immediately; a failed write is reported
    /// but the cached value still honors the command for this session.
    fn persist(&mut self, s: Schedule) {
        if let Err(e) = self.store.save(&s) {
            tracing::warn!(error = %e, "failed to persist schedule");
        }
        self.schedule = s;
    }

    fn start_run(&mut self, source: RunSource, planned: Duration) {
        match self.relay.on() {
            Ok(()) => {
                self.relay_on = true;
                self.notify_relay(DeviceStatus::On);
                self.run_state = RunState::Running {
                    source,
                    started_at: self.clock.now(),
                    planned,
                };
                tracing::info!(?source, planned_secs = planned.as_secs(), "run started");
            }
            Err(e) => {
                // Not latched to Running: a scheduled start retries on the
                // next tick while the minute still matches; a test command
                // is consumed.
                tracing::warn!(error = %map_hw_error(&*e), "relay on failed; run not started");
                self.notify_relay(DeviceStatus::Error);
            }
        }
    }

    /// Resolve a pending stop or run expiry. Idle is entered only once the
    /// relay confirms off; a failed off keeps the stopping posture so the
    /// command is retried on every subsequent tick.
    fn finish_stop(&mut self) {
        match self.relay.off() {
            Ok(()) => {
                self.relay_on = false;
                self.notify_relay(DeviceStatus::Off);
                self.run_state = RunState::Idle;
                tracing::info!("run stopped");
            }
            Err(e) => {
                tracing::warn!(error = %map_hw_error(&*e), "relay off failed; retrying next tick");
                self.notify_relay(DeviceStatus::Error);
                self.run_state = RunState::CancelRequested;
            }
        }
    }

    /// Re-assert the relay while a run is active. Defends against a driver
    /// that silently reset after a brief brown-out; idempotent, and quiet
    /// unless the underlying call fails.
    fn reassert_on(&mut self) {
        match self.relay.on() {
            Ok(()) => {
                self.relay_on = true;
                self.notify_relay(DeviceStatus::On);
            }
            Err(e) => {
                tracing::warn!(error = %map_hw_error(&*e), "relay re-assert failed");
                self.notify_relay(DeviceStatus::Error);
            }
        }
    }

    /// Track RTC availability; notify the sink only on transition so steady
    /// state never floods it.
    fn update_clock_health(&mut self, available: bool) {
        let next = if available {
            ClockHealth::Available
        } else {
            ClockHealth::Unavailable
        };
        if self.clock_health != next {
            if available {
                self.sink.notify(Component::Rtc, DeviceStatus::Ok);
            } else {
                tracing::warn!("rtc unavailable; scheduling suppressed until it recovers");
                self.sink.notify(Component::Rtc, DeviceStatus::Error);
            }
            self.clock_health = next;
        }
    }

    fn notify_relay(&mut self, status: DeviceStatus) {
        if self.relay_reported != Some(status) {
            self.sink.notify(Component::Relay, status);
            self.relay_reported = Some(status);
        }
    }
}

/// Builder for `Controller`. Relay and schedule store are required; the
/// rest defaults to a monotonic clock, a discarding status sink, a 60 s
/// test run, and a small command queue.
pub struct ControllerBuilder<R: Relay, S: ScheduleStore> {
    relay: Option<R>,
    store: Option<S>,
    sink: Option<Box<dyn StatusSink + Send>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    test_duration: Duration,
    queue_capacity: usize,
}

impl<R: Relay, S: ScheduleStore> Default for ControllerBuilder<R, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Relay, S: ScheduleStore> ControllerBuilder<R, S> {
    pub fn new() -> Self {
        Self {
            relay: None,
            store: None,
            sink: None,
            clock: None,
            test_duration: Duration::from_secs(60),
            queue_capacity: 8,
        }
    }

    pub fn with_relay(mut self, relay: R) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn with_store(mut self, store: S) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_status_sink(mut self, sink: impl StatusSink + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fixed duration of a manual test run, independent of the schedule.
    pub fn with_test_duration(mut self, d: Duration) -> Self {
        self.test_duration = d;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn build(self) -> crate::error::Result<Controller<R, S>> {
        let relay = self
            .relay
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRelay))?;
        let mut store = self
            .store
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStore))?;
        if self.test_duration.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "test duration must be non-zero",
            )));
        }
        let sink = self.sink.unwrap_or_else(|| Box::new(NullSink));
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let (intake, drain) = command_channel(self.queue_capacity);
        let schedule = store.load();

        Ok(Controller {
            relay,
            store,
            sink,
            clock,
            drain,
            intake,
            test_duration: self.test_duration,
            run_state: RunState::Idle,
            clock_health: ClockHealth::Unknown,
            schedule,
            relay_on: false,
            relay_reported: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MemoryStore, NoopRelay};

    #[test]
    fn build_requires_relay_and_store() {
        let err = Controller::<NoopRelay, MemoryStore>::builder()
            .with_store(MemoryStore::new(Schedule::disabled()))
            .build()
            .expect_err("missing relay");
        assert!(err.downcast_ref::<BuildError>().is_some());

        let err = Controller::<NoopRelay, MemoryStore>::builder()
            .with_relay(NoopRelay)
            .build()
            .expect_err("missing store");
        assert!(err.downcast_ref::<BuildError>().is_some());
    }

    #[test]
    fn build_rejects_zero_test_duration() {
        let err = Controller::builder()
            .with_relay(NoopRelay)
            .with_store(MemoryStore::new(Schedule::disabled()))
            .with_test_duration(Duration::ZERO)
            .build()
            .expect_err("zero test duration");
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(_))
        ));
    }

    #[test]
    fn fresh_controller_snapshot_is_idle() {
        let ctrl = Controller::builder()
            .with_relay(NoopRelay)
            .with_store(MemoryStore::new(Schedule::factory_default()))
            .build()
            .expect("build");
        let snap = ctrl.snapshot();
        assert_eq!(snap.run, RunSnapshot::Idle);
        assert!(!snap.relay_on);
        assert_eq!(snap.scheduled_minutes, 10);
    }
}
