//! The periodic driver: ticks the controller at a fixed cadence until
//! shutdown is requested, then forces the relay into the fail-safe state.
//!
//! Drift and jitter are tolerated. The scheduling match is exact-minute, so
//! ticking faster than once per minute merely re-checks the same minute
//! (harmless: the idle-to-running transition is not re-entered), while
//! ticking slower risks missing the minute boundary and with it that day's
//! run. That is accepted behavior, not masked.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use irrigator_traits::clock::Clock;
use irrigator_traits::{Relay, Rtc, WallTime};

use crate::controller::Controller;
use crate::store::ScheduleStore;

/// Relay-off attempts during fail-safe shutdown before giving up.
const SHUTDOWN_OFF_ATTEMPTS: u32 = 5;

/// Read the RTC, mapping any fault to "no reading this tick". Never fatal;
/// the controller debounces the resulting availability transitions.
pub fn read_rtc<T: Rtc>(rtc: &mut T) -> Option<WallTime> {
    match rtc.read_time() {
        Ok(t) => Some(t),
        Err(e) => {
            tracing::trace!(error = %e, "rtc read failed");
            None
        }
    }
}

/// Drive the controller until `shutdown` is raised, then command the relay
/// off (retried) before returning.
///
/// The RTC and relay are touched only from this thread; the command queue
/// inside the controller is the sole cross-thread hand-off.
pub fn run<R, S, T, C>(
    mut controller: Controller<R, S>,
    mut rtc: T,
    clock: C,
    period: Duration,
    shutdown: Arc<AtomicBool>,
) -> crate::error::Result<()>
where
    R: Relay,
    S: ScheduleStore,
    T: Rtc,
    C: Clock,
{
    tracing::info!(period_ms = period.as_millis() as u64, "controller loop started");

    while !shutdown.load(Ordering::Relaxed) {
        let now = read_rtc(&mut rtc);
        controller.tick(now);

        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        clock.sleep(period);
    }

    tracing::info!("shutdown requested; forcing relay off");
    controller.make_safe(SHUTDOWN_OFF_ATTEMPTS)
}
