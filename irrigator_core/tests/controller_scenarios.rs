//! End-to-end controller scenarios driven through `tick`, with a spy relay
//! and a recording status sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use irrigator_config::Schedule;
use irrigator_core::mocks::{ManualClock, MemoryStore};
use irrigator_core::{
    Command, Component, Controller, DeviceStatus, RunSnapshot, RunSource, ScheduleStore,
    StatusSink,
};
use irrigator_traits::{Relay, WallTime};
use rstest::rstest;

fn t(hour: u8, minute: u8) -> WallTime {
    WallTime::new(hour, minute).expect("valid test time")
}

/// Relay that records every driver call and tracks energized state.
#[derive(Clone, Default)]
struct SpyRelay {
    calls: Arc<Mutex<Vec<&'static str>>>,
    energized: Arc<AtomicBool>,
}

impl SpyRelay {
    fn on_calls(&self) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == "on").count()
    }
    fn off_calls(&self) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == "off").count()
    }
    fn is_energized(&self) -> bool {
        self.energized.load(Ordering::Relaxed)
    }
}

impl Relay for SpyRelay {
    fn on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.calls.lock().unwrap().push("on");
        self.energized.store(true, Ordering::Relaxed);
        Ok(())
    }
    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.calls.lock().unwrap().push("off");
        self.energized.store(false, Ordering::Relaxed);
        Ok(())
    }
}

/// Sink collecting every (component, status) notification.
#[derive(Clone, Default)]
struct RecordingSink {
    events: Arc<Mutex<Vec<(Component, DeviceStatus)>>>,
}

impl RecordingSink {
    fn count(&self, component: Component, status: DeviceStatus) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, s)| *c == component && *s == status)
            .count()
    }
}

impl StatusSink for RecordingSink {
    fn notify(&mut self, component: Component, status: DeviceStatus) {
        self.events.lock().unwrap().push((component, status));
    }
}

/// Store whose saves are accepted but discarded; the loaded record never
/// changes. Lets tests pin the schedule while commands try to mutate it.
struct PinnedStore(Schedule);

impl ScheduleStore for PinnedStore {
    fn load(&mut self) -> Schedule {
        self.0
    }
    fn save(&mut self, _schedule: &Schedule) -> eyre::Result<()> {
        Ok(())
    }
}

fn schedule(hour: u8, minute: u8, duration_minutes: u32) -> Schedule {
    Schedule {
        start_time: Some(t(hour, minute)),
        duration_minutes,
    }
}

struct Fixture {
    controller: Controller<SpyRelay, MemoryStore>,
    relay: SpyRelay,
    sink: RecordingSink,
    clock: ManualClock,
}

fn fixture(sched: Schedule) -> Fixture {
    let relay = SpyRelay::default();
    let sink = RecordingSink::default();
    let clock = ManualClock::new();
    let controller = Controller::builder()
        .with_relay(relay.clone())
        .with_store(MemoryStore::new(sched))
        .with_status_sink(sink.clone())
        .with_clock(Arc::new(clock.clone()))
        .build()
        .expect("build controller");
    Fixture {
        controller,
        relay,
        sink,
        clock,
    }
}

#[rstest]
fn scheduled_run_starts_at_minute_and_stops_after_duration() {
    let mut f = fixture(schedule(8, 0, 10));

    f.controller.tick(Some(t(7, 59)));
    assert!(!f.relay.is_energized(), "must not start before the minute");

    f.controller.tick(Some(t(8, 0)));
    assert!(f.relay.is_energized(), "must start on the exact minute");
    assert_eq!(f.sink.count(Component::Relay, DeviceStatus::On), 1);

    // Minutes 08:01 through 08:09: still inside the planned 10 minutes.
    for m in 1..10 {
        f.clock.advance(Duration::from_secs(60));
        f.controller.tick(Some(t(8, m)));
        assert!(f.relay.is_energized(), "still running at 08:{m:02}");
    }

    // Elapsed reaches 10 minutes: off exactly once.
    f.clock.advance(Duration::from_secs(60));
    f.controller.tick(Some(t(8, 10)));
    assert!(!f.relay.is_energized());
    assert_eq!(f.relay.off_calls(), 1);
    assert_eq!(f.sink.count(Component::Relay, DeviceStatus::Off), 1);

    f.clock.advance(Duration::from_secs(60));
    f.controller.tick(Some(t(8, 11)));
    assert_eq!(f.relay.off_calls(), 1, "idle ticks command nothing");
    // One On transition for the whole scenario, despite per-tick re-asserts.
    assert_eq!(f.sink.count(Component::Relay, DeviceStatus::On), 1);
}

#[rstest]
fn repeated_ticks_in_the_start_minute_do_not_double_start() {
    let mut f = fixture(schedule(8, 0, 10));

    f.controller.tick(Some(t(8, 0)));
    f.controller.tick(Some(t(8, 0)));
    f.controller.tick(Some(t(8, 0)));

    assert_eq!(f.sink.count(Component::Relay, DeviceStatus::On), 1);
    match f.controller.snapshot().run {
        RunSnapshot::Running { source, .. } => assert_eq!(source, RunSource::Scheduled),
        other => panic!("expected Running, got {other:?}"),
    }
}

#[rstest]
#[case(Schedule { start_time: Some(t(8, 0)), duration_minutes: 0 })]
#[case(Schedule { start_time: None, duration_minutes: 10 })]
fn disabled_schedule_never_triggers(#[case] sched: Schedule) {
    let mut f = fixture(sched);
    for m in 0..5 {
        f.controller.tick(Some(t(8, m)));
    }
    assert_eq!(f.relay.on_calls(), 0);
    assert_eq!(f.controller.snapshot().run, RunSnapshot::Idle);
}

#[rstest]
fn turn_off_resolves_before_a_coincident_scheduled_match() {
    // Pinned store keeps the schedule enabled even after TurnOff persists a
    // disabled record, forcing the same-tick cancel-vs-start race.
    let relay = SpyRelay::default();
    let clock = ManualClock::new();
    let mut controller = Controller::builder()
        .with_relay(relay.clone())
        .with_store(PinnedStore(schedule(8, 0, 10)))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .expect("build controller");

    controller.tick(Some(t(8, 0)));
    assert!(relay.is_energized());

    let intake = controller.intake();
    intake.enqueue(Command::TurnOff);

    // Same minute, schedule still matches: cancel must win this tick.
    controller.tick(Some(t(8, 0)));
    assert!(!relay.is_energized(), "cancel beats the coincident match");
    assert_eq!(controller.snapshot().run, RunSnapshot::Idle);
    assert_eq!(relay.off_calls(), 1);
}

#[rstest]
fn turn_off_persists_a_disabled_schedule() {
    let mut f = fixture(schedule(8, 0, 10));
    f.controller.intake().enqueue(Command::TurnOff);
    f.controller.tick(Some(t(7, 0)));

    let snap = f.controller.snapshot();
    assert_eq!(snap.scheduled_start, None);
    assert_eq!(snap.scheduled_minutes, 0);

    // The persisted record is disabled too: the start minute passes quietly.
    f.controller.tick(Some(t(8, 0)));
    assert_eq!(f.relay.on_calls(), 0);
}

#[rstest]
fn test_run_uses_fixed_duration_not_schedule() {
    let mut f = fixture(schedule(8, 0, 10));
    f.controller.intake().enqueue(Command::RunTest);

    f.controller.tick(Some(t(7, 0)));
    assert!(f.relay.is_energized());
    match f.controller.snapshot().run {
        RunSnapshot::Running { source, remaining } => {
            assert_eq!(source, RunSource::Manual);
            assert!(remaining <= Duration::from_secs(60), "fixed 60 s, not 10 min");
        }
        other => panic!("expected Running, got {other:?}"),
    }

    f.clock.advance(Duration::from_secs(59));
    f.controller.tick(Some(t(7, 0)));
    assert!(f.relay.is_energized(), "59 s elapsed, still running");

    f.clock.advance(Duration::from_secs(1));
    f.controller.tick(Some(t(7, 1)));
    assert!(!f.relay.is_energized(), "stops at the fixed test duration");
}

#[rstest]
fn test_run_cannot_interrupt_a_run_in_progress() {
    let mut f = fixture(schedule(8, 0, 10));

    f.controller.tick(Some(t(8, 0)));
    let before = f.controller.snapshot();

    f.controller.intake().enqueue(Command::RunTest);
    f.controller.tick(Some(t(8, 0)));
    let after = f.controller.snapshot();

    assert_eq!(before.run, after.run, "existing run untouched");
    assert_eq!(f.sink.count(Component::Relay, DeviceStatus::On), 1);
}

#[rstest]
fn clock_loss_does_not_halt_elapsed_accounting() {
    let mut f = fixture(schedule(8, 0, 10));

    f.controller.tick(Some(t(8, 0)));
    assert!(f.relay.is_energized());

    // RTC goes dark mid-run; duration is measured by the controller's own
    // clock, so the run still ends on time.
    f.clock.advance(Duration::from_secs(300));
    f.controller.tick(None);
    assert!(f.relay.is_energized());

    f.clock.advance(Duration::from_secs(300));
    f.controller.tick(None);
    assert!(!f.relay.is_energized(), "run ends despite missing RTC");

    assert_eq!(f.sink.count(Component::Rtc, DeviceStatus::Error), 1);
}

#[rstest]
fn rtc_status_is_reported_only_on_transition() {
    let mut f = fixture(schedule(8, 0, 10));

    f.controller.tick(Some(t(7, 0)));
    f.controller.tick(Some(t(7, 0)));
    assert_eq!(f.sink.count(Component::Rtc, DeviceStatus::Ok), 1);

    for _ in 0..5 {
        f.controller.tick(None);
    }
    assert_eq!(f.sink.count(Component::Rtc, DeviceStatus::Error), 1);

    f.controller.tick(Some(t(7, 1)));
    assert_eq!(f.sink.count(Component::Rtc, DeviceStatus::Ok), 2);
}

#[rstest]
fn schedule_edit_does_not_shorten_a_live_run() {
    let mut f = fixture(schedule(8, 0, 10));

    f.controller.tick(Some(t(8, 0)));
    f.controller
        .intake()
        .enqueue(Command::SetSchedule(schedule(9, 0, 1)));

    // New schedule persisted, but the live run keeps its 10 minute plan.
    f.clock.advance(Duration::from_secs(120));
    f.controller.tick(Some(t(8, 2)));
    assert!(f.relay.is_energized(), "edit must not cut the run short");
    assert_eq!(f.controller.snapshot().scheduled_start, Some(t(9, 0)));

    f.clock.advance(Duration::from_secs(480));
    f.controller.tick(Some(t(8, 10)));
    assert!(!f.relay.is_energized(), "original plan still bounds the run");
}

#[rstest]
fn externally_edited_schedule_is_honored_without_restart() {
    // Shared store stands in for a schedule file edited behind the
    // controller's back.
    #[derive(Clone)]
    struct SharedStore(Arc<Mutex<Schedule>>);
    impl ScheduleStore for SharedStore {
        fn load(&mut self) -> Schedule {
            *self.0.lock().unwrap()
        }
        fn save(&mut self, schedule: &Schedule) -> eyre::Result<()> {
            *self.0.lock().unwrap() = *schedule;
            Ok(())
        }
    }

    let shared = SharedStore(Arc::new(Mutex::new(Schedule::disabled())));
    let relay = SpyRelay::default();
    let mut controller = Controller::builder()
        .with_relay(relay.clone())
        .with_store(shared.clone())
        .build()
        .expect("build controller");

    controller.tick(Some(t(8, 5)));
    assert_eq!(relay.on_calls(), 0);

    *shared.0.lock().unwrap() = schedule(8, 6, 5);
    controller.tick(Some(t(8, 6)));
    assert!(relay.is_energized(), "fresh record picked up mid-flight");
}
