pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::fmt;
use std::str::FromStr;

/// Wall-clock reading with minute resolution and no date component.
///
/// The appliance has no reliable date source; scheduling matches on
/// hour/minute alone, once per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WallTime {
    hour: u8,
    minute: u8,
}

impl WallTime {
    /// Construct a wall-clock time, rejecting out-of-range fields.
    pub fn new(hour: u8, minute: u8) -> Result<Self, InvalidWallTime> {
        if hour > 23 || minute > 59 {
            return Err(InvalidWallTime { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    #[inline]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    #[inline]
    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A wall-clock time with fields outside `00:00..=23:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidWallTime {
    pub hour: u8,
    pub minute: u8,
}

impl fmt::Display for InvalidWallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid wall-clock time {:02}:{:02}",
            self.hour, self.minute
        )
    }
}

impl std::error::Error for InvalidWallTime {}

impl FromStr for WallTime {
    type Err = InvalidWallTime;

    /// Parse the persisted `"HH:MM"` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = InvalidWallTime {
            hour: u8::MAX,
            minute: u8::MAX,
        };
        let (h, m) = s.split_once(':').ok_or(invalid)?;
        let hour: u8 = h.parse().map_err(|_| invalid)?;
        let minute: u8 = m.parse().map_err(|_| invalid)?;
        WallTime::new(hour, minute)
    }
}

/// Real-time-clock reader.
///
/// Implementations wrap a hardware device; any read fault is surfaced as an
/// error and the caller treats it as "no reading this tick", never as fatal.
pub trait Rtc {
    fn read_time(&mut self) -> Result<WallTime, Box<dyn std::error::Error + Send + Sync>>;
}

/// Binary actuator driving the pump relay. Commands may fail transiently.
pub trait Relay {
    fn on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
