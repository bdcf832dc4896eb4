#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and schedule persistence for the irrigation controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The persisted `Schedule` record lives in its own small file with
//!   whole-record overwrite semantics; see the `schedule` module.

pub mod schedule;

pub use schedule::{Schedule, load_schedule_file, parse_schedule, save_schedule_file};

use serde::Deserialize;
use std::path::Path;

/// I2C addressing for the relay unit.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RelayCfg {
    pub i2c_bus: u8,
    pub i2c_addr: u8,
}

impl Default for RelayCfg {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            i2c_addr: 0x26,
        }
    }
}

/// I2C addressing for the real-time clock.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RtcCfg {
    pub i2c_bus: u8,
    pub i2c_addr: u8,
}

impl Default for RtcCfg {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            i2c_addr: 0x68,
        }
    }
}

/// Controller loop knobs.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControllerCfg {
    /// Scheduling period in milliseconds. Nominal 1000; ticking faster than
    /// once per minute is harmless, slower risks missing the start minute.
    pub tick_ms: u64,
    /// Fixed duration of a manually triggered test run, in seconds.
    /// Independent of the persisted schedule duration.
    pub test_run_secs: u64,
    /// Path of the persisted schedule record.
    pub schedule_file: String,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            test_run_secs: 60,
            schedule_file: "schedule.toml".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub relay: RelayCfg,
    pub rtc: RtcCfg,
    pub controller: ControllerCfg,
    pub logging: Logging,
}

impl Config {
    /// Cross-field validation beyond what serde can express.
    pub fn validate(&self) -> eyre::Result<()> {
        if self.controller.tick_ms == 0 {
            eyre::bail!("controller.tick_ms must be > 0");
        }
        if self.controller.test_run_secs == 0 {
            eyre::bail!("controller.test_run_secs must be > 0");
        }
        if self.controller.schedule_file.is_empty() {
            eyre::bail!("controller.schedule_file must not be empty");
        }
        // I2C uses 7-bit addressing; reserved ranges excluded.
        for (name, addr) in [
            ("relay.i2c_addr", self.relay.i2c_addr),
            ("rtc.i2c_addr", self.rtc.i2c_addr),
        ] {
            if !(0x08..=0x77).contains(&addr) {
                eyre::bail!("{name} must be a valid 7-bit I2C address (0x08..=0x77)");
            }
        }
        Ok(())
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse, and validate a config file.
pub fn load_config(path: &Path) -> eyre::Result<Config> {
    use eyre::WrapErr;
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    let cfg = load_toml(&text).wrap_err_with(|| format!("parsing config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
