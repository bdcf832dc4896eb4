//! Property tests: relay transitions stay well-formed under arbitrary
//! interleavings of ticks, clock advances, and commands.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use irrigator_config::Schedule;
use irrigator_core::mocks::{ManualClock, MemoryStore};
use irrigator_core::{Command, Controller};
use irrigator_traits::{Relay, WallTime};
use proptest::prelude::*;

/// Relay that records energized-state transitions (not raw calls).
#[derive(Clone, Default)]
struct TrackingRelay {
    state: Arc<Mutex<bool>>,
    transitions: Arc<Mutex<Vec<bool>>>,
}

impl Relay for TrackingRelay {
    fn on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.state.lock().unwrap();
        if !*state {
            *state = true;
            self.transitions.lock().unwrap().push(true);
        }
        Ok(())
    }
    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.state.lock().unwrap();
        if *state {
            *state = false;
            self.transitions.lock().unwrap().push(false);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Op {
    Tick(Option<(u8, u8)>),
    Advance(u16),
    TurnOff,
    RunTest,
    SetSchedule { hour: u8, minute: u8, mins: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (proptest::option::of((0u8..24, 0u8..60))).prop_map(Op::Tick),
        2 => (0u16..600).prop_map(Op::Advance),
        1 => Just(Op::TurnOff),
        1 => Just(Op::RunTest),
        1 => (0u8..24, 0u8..60, 0u8..30)
            .prop_map(|(hour, minute, mins)| Op::SetSchedule { hour, minute, mins }),
    ]
}

fn wall(hour: u8, minute: u8) -> WallTime {
    WallTime::new(hour, minute).expect("strategy emits valid times")
}

proptest! {
    #[test]
    fn relay_transitions_always_alternate(ops in proptest::collection::vec(op_strategy(), 0..120)) {
        let relay = TrackingRelay::default();
        let clock = ManualClock::new();
        let mut controller = Controller::builder()
            .with_relay(relay.clone())
            .with_store(MemoryStore::new(Schedule::factory_default()))
            .with_clock(Arc::new(clock.clone()))
            .with_test_duration(Duration::from_secs(60))
            .build()
            .expect("build controller");
        let intake = controller.intake();

        for op in ops {
            match op {
                Op::Tick(now) => controller.tick(now.map(|(h, m)| wall(h, m))),
                Op::Advance(secs) => clock.advance(Duration::from_secs(u64::from(secs))),
                Op::TurnOff => {
                    let _ = intake.enqueue(Command::TurnOff);
                }
                Op::RunTest => {
                    let _ = intake.enqueue(Command::RunTest);
                }
                Op::SetSchedule { hour, minute, mins } => {
                    let _ = intake.enqueue(Command::SetSchedule(Schedule {
                        start_time: Some(wall(hour, minute)),
                        duration_minutes: u32::from(mins),
                    }));
                }
            }

            // With an infallible relay the controller's belief must match
            // the device, and the run state must agree with both.
            let snap = controller.snapshot();
            let device_on = *relay.state.lock().unwrap();
            prop_assert_eq!(snap.relay_on, device_on);
            match snap.run {
                irrigator_core::RunSnapshot::Running { .. } => prop_assert!(device_on),
                irrigator_core::RunSnapshot::Idle => prop_assert!(!device_on),
                irrigator_core::RunSnapshot::Stopping => {
                    prop_assert!(false, "stopping state requires a relay fault");
                }
            }
        }

        // No double-start, no double-stop: energized-state transitions must
        // strictly alternate, beginning with an on-transition.
        let transitions = relay.transitions.lock().unwrap().clone();
        for pair in transitions.windows(2) {
            prop_assert_ne!(pair[0], pair[1], "transitions must alternate");
        }
        if let Some(first) = transitions.first() {
            prop_assert!(*first, "first transition must be on");
        }
    }

    #[test]
    fn disabled_schedule_never_energizes(
        hour in 0u8..24,
        minute in 0u8..60,
        ticks in proptest::collection::vec(proptest::option::of((0u8..24, 0u8..60)), 0..200),
    ) {
        let relay = TrackingRelay::default();
        let sched = Schedule { start_time: Some(wall(hour, minute)), duration_minutes: 0 };
        let mut controller = Controller::builder()
            .with_relay(relay.clone())
            .with_store(MemoryStore::new(sched))
            .build()
            .expect("build controller");

        for now in ticks {
            controller.tick(now.map(|(h, m)| wall(h, m)));
        }

        prop_assert!(relay.transitions.lock().unwrap().is_empty());
    }
}
