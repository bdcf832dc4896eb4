//! The persisted daily schedule: one record, whole-record replace.
//!
//! On-disk form is a tiny TOML file:
//!
//! ```toml
//! start_time = "07:00"   # empty string when disabled
//! duration_minutes = 10
//! ```
//!
//! Writes go through a temp-file + rename so a power cut mid-save never
//! leaves a torn record. A missing or unreadable file loads as the
//! factory default rather than an error; the appliance must come up with
//! a working schedule no matter what is on flash.

use eyre::WrapErr;
use irrigator_traits::WallTime;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Daily watering schedule. `duration_minutes == 0` means disabled; a
/// disabled schedule never triggers a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub start_time: Option<WallTime>,
    pub duration_minutes: u32,
}

impl Schedule {
    /// The schedule shipped on a factory-fresh (or corrupted) device.
    pub fn factory_default() -> Self {
        Self {
            // 07:00 is always constructible; unwrap is fine on a constant.
            start_time: WallTime::new(7, 0).ok(),
            duration_minutes: 10,
        }
    }

    /// A schedule that never triggers. Written by the "turn off" command.
    pub fn disabled() -> Self {
        Self {
            start_time: None,
            duration_minutes: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.start_time.is_some() && self.duration_minutes > 0
    }
}

/// Raw serde form of the record. Kept separate from the domain type so the
/// empty-string convention for "no start time" stays at the file boundary.
#[derive(Debug, Serialize, Deserialize)]
struct ScheduleRecord {
    start_time: String,
    duration_minutes: u32,
}

impl From<&Schedule> for ScheduleRecord {
    fn from(s: &Schedule) -> Self {
        Self {
            start_time: s.start_time.map(|t| t.to_string()).unwrap_or_default(),
            duration_minutes: s.duration_minutes,
        }
    }
}

impl TryFrom<ScheduleRecord> for Schedule {
    type Error = eyre::Report;

    fn try_from(rec: ScheduleRecord) -> eyre::Result<Self> {
        let start_time = if rec.start_time.is_empty() {
            None
        } else {
            Some(
                rec.start_time
                    .parse::<WallTime>()
                    .map_err(|e| eyre::eyre!("bad start_time {:?}: {e}", rec.start_time))?,
            )
        };
        Ok(Self {
            start_time,
            duration_minutes: rec.duration_minutes,
        })
    }
}

/// Parse a schedule record from TOML text.
pub fn parse_schedule(s: &str) -> eyre::Result<Schedule> {
    let rec: ScheduleRecord = toml::from_str(s).wrap_err("parsing schedule record")?;
    rec.try_into()
}

/// Load the schedule record, falling back to the factory default when the
/// file is missing or unreadable. The fallback is deliberate: see module docs.
pub fn load_schedule_file(path: &Path) -> Schedule {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_schedule(&text).unwrap_or_else(|_| Schedule::factory_default()),
        Err(_) => Schedule::factory_default(),
    }
}

/// Persist the schedule record with whole-record overwrite.
pub fn save_schedule_file(path: &Path, schedule: &Schedule) -> eyre::Result<()> {
    let rec = ScheduleRecord::from(schedule);
    let text = toml::to_string(&rec).wrap_err("serializing schedule record")?;
    write_atomic(path, text.as_bytes())
        .wrap_err_with(|| format!("writing schedule {}", path.display()))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(tmp, path)
}
