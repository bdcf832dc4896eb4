//! Schedule persistence seam.
//!
//! Loading is infallible by design: the appliance must always come up with a
//! usable schedule, so a broken record degrades to the factory default at
//! the `irrigator_config` layer. Saving can fail (flash wear, full fs) and
//! the caller decides how loudly to complain.

use irrigator_config::{Schedule, load_schedule_file, save_schedule_file};
use std::path::PathBuf;

pub trait ScheduleStore {
    fn load(&mut self) -> Schedule;
    fn save(&mut self, schedule: &Schedule) -> eyre::Result<()>;
}

/// File-backed store: one small TOML record, whole-record overwrite.
#[derive(Debug, Clone)]
pub struct FileScheduleStore {
    path: PathBuf,
}

impl FileScheduleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ScheduleStore for FileScheduleStore {
    fn load(&mut self) -> Schedule {
        load_schedule_file(&self.path)
    }

    fn save(&mut self, schedule: &Schedule) -> eyre::Result<()> {
        save_schedule_file(&self.path, schedule)
    }
}
