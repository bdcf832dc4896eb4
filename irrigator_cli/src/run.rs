//! Controller assembly and subcommand execution.
//!
//! The relay and RTC are either real I2C devices (`hardware` feature, Linux)
//! or host-clock-backed simulations; everything above that seam is shared.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use irrigator_config::Config;
use irrigator_core::util::tick_period;
use irrigator_core::{
    Command, Component, Controller, DeviceStatus, EnqueueOutcome, FileScheduleStore, RunSnapshot,
    StatusSink, runner,
};
use irrigator_traits::clock::{Clock, MonotonicClock};
use irrigator_traits::{Relay, Rtc};
use serde_json::json;

use crate::cli::JSON_MODE;

#[cfg(all(feature = "hardware", target_os = "linux"))]
type AppRelay = irrigator_hardware::I2cRelay;
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
type AppRelay = irrigator_hardware::SimulatedRelay;

#[cfg(all(feature = "hardware", target_os = "linux"))]
type AppRtc = irrigator_hardware::I2cRtc;
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
type AppRtc = irrigator_hardware::SimulatedRtc;

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn make_relay(cfg: &Config) -> eyre::Result<AppRelay> {
    irrigator_hardware::I2cRelay::new(cfg.relay.i2c_bus, cfg.relay.i2c_addr)
        .wrap_err("opening relay I2C device")
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn make_relay(_cfg: &Config) -> eyre::Result<AppRelay> {
    Ok(irrigator_hardware::SimulatedRelay::new())
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn make_rtc(cfg: &Config) -> eyre::Result<AppRtc> {
    irrigator_hardware::I2cRtc::new(cfg.rtc.i2c_bus, cfg.rtc.i2c_addr)
        .wrap_err("opening rtc I2C device")
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn make_rtc(_cfg: &Config) -> eyre::Result<AppRtc> {
    Ok(irrigator_hardware::SimulatedRtc::new())
}

/// Forwards status transitions to the log. The controller already debounces,
/// so every call here is a real change.
struct LogSink;

impl StatusSink for LogSink {
    fn notify(&mut self, component: Component, status: DeviceStatus) {
        tracing::info!(?component, ?status, "status changed");
    }
}

fn build_controller(cfg: &Config) -> eyre::Result<Controller<AppRelay, FileScheduleStore>> {
    Controller::builder()
        .with_relay(make_relay(cfg)?)
        .with_store(FileScheduleStore::new(cfg.controller.schedule_file.as_str()))
        .with_status_sink(LogSink)
        .with_test_duration(Duration::from_secs(cfg.controller.test_run_secs))
        .build()
}

/// `run`: drive the scheduling loop until Ctrl-C, then force the relay off.
pub fn run_loop(cfg: &Config, tick_override: Option<u64>) -> eyre::Result<()> {
    let controller = build_controller(cfg)?;
    let rtc = make_rtc(cfg)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .wrap_err("installing signal handler")?;

    let period = tick_period(tick_override.unwrap_or(cfg.controller.tick_ms));
    runner::run(controller, rtc, MonotonicClock::new(), period, shutdown)
}

/// `test-cycle`: enqueue one fixed-duration manual run and tick the
/// controller until the run completes and the relay is confirmed off.
pub fn test_cycle(cfg: &Config) -> eyre::Result<()> {
    let mut controller = build_controller(cfg)?;
    let mut rtc = make_rtc(cfg)?;

    if controller.intake().enqueue(Command::RunTest) == EnqueueOutcome::Busy {
        eyre::bail!("a test run command is already queued");
    }

    let clock = MonotonicClock::new();
    let period = tick_period(cfg.controller.tick_ms);
    let planned = Duration::from_secs(cfg.controller.test_run_secs);
    // Generous slack for tick jitter and off-retries on a slow relay.
    let deadline = clock.now() + planned + period * 10 + Duration::from_secs(2);
    let mut started = false;

    loop {
        let now = runner::read_rtc(&mut rtc);
        controller.tick(now);

        match controller.snapshot().run {
            RunSnapshot::Running { .. } => {
                if !started {
                    started = true;
                    tracing::info!(secs = planned.as_secs(), "test run started");
                }
            }
            RunSnapshot::Idle if started => break,
            RunSnapshot::Idle => {
                eyre::bail!("test run did not start; check the relay wiring and logs")
            }
            RunSnapshot::Stopping => {}
        }

        if clock.now() > deadline {
            let _ = controller.make_safe(5);
            eyre::bail!("test run did not finish in time; relay off not confirmed");
        }
        clock.sleep(period);
    }

    if *JSON_MODE.get().unwrap_or(&false) {
        println!("{}", json!({ "test_cycle": "ok", "secs": planned.as_secs() }));
    } else {
        println!("test cycle complete ({} s)", planned.as_secs());
    }
    Ok(())
}

/// `self-check`: probe the RTC and the relay without starting a run. The
/// relay probe commands off, which is a no-op in the safe state.
pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let mut rtc = make_rtc(cfg)?;
    let mut relay = make_relay(cfg)?;

    let rtc_result = rtc.read_time();
    let relay_result = relay.off();

    let rtc_ok = rtc_result.is_ok();
    let relay_ok = relay_result.is_ok();

    if *JSON_MODE.get().unwrap_or(&false) {
        let body = json!({
            "rtc": if rtc_ok { "ok" } else { "error" },
            "relay": if relay_ok { "ok" } else { "error" },
            "time": rtc_result.as_ref().ok().map(ToString::to_string),
            "ok": rtc_ok && relay_ok,
        });
        println!("{body}");
    } else {
        match &rtc_result {
            Ok(t) => println!("rtc: ok ({t})"),
            Err(e) => println!("rtc: error ({e})"),
        }
        match &relay_result {
            Ok(()) => println!("relay: ok"),
            Err(e) => println!("relay: error ({e})"),
        }
    }

    if !(rtc_ok && relay_ok) {
        eyre::bail!("self-check failed");
    }
    Ok(())
}

/// `health`: one JSON snapshot of controller state for monitoring scripts.
pub fn health(cfg: &Config) -> eyre::Result<()> {
    let controller = build_controller(cfg)?;
    let snap = controller.snapshot();

    let body = json!({
        "run_state": run_state_name(snap.run),
        "relay_on": snap.relay_on,
        "schedule": {
            "start_time": snap.scheduled_start.map(|t| t.to_string()),
            "duration_minutes": snap.scheduled_minutes,
            "enabled": snap.scheduled_start.is_some() && snap.scheduled_minutes > 0,
        },
        "schedule_file": cfg.controller.schedule_file,
    });
    println!("{body}");
    Ok(())
}

pub fn run_state_name(run: RunSnapshot) -> &'static str {
    match run {
        RunSnapshot::Idle => "idle",
        RunSnapshot::Running { .. } => "running",
        RunSnapshot::Stopping => "stopping",
    }
}
