pub mod bcd;
pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod i2c;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use i2c::{I2cRelay, I2cRtc};

use irrigator_traits::{Relay, Rtc, WallTime};
use std::time::{SystemTime, UNIX_EPOCH};

/// Simulated relay: tracks commanded state, never fails.
#[derive(Debug, Default)]
pub struct SimulatedRelay {
    energized: bool,
}

impl SimulatedRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_energized(&self) -> bool {
        self.energized
    }
}

impl Relay for SimulatedRelay {
    fn on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.energized {
            tracing::info!("relay on (simulated)");
        }
        self.energized = true;
        Ok(())
    }

    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.energized {
            tracing::info!("relay off (simulated)");
        }
        self.energized = false;
        Ok(())
    }
}

/// Simulated RTC backed by the host clock (UTC, no date).
#[derive(Debug, Default)]
pub struct SimulatedRtc;

impl SimulatedRtc {
    pub fn new() -> Self {
        Self
    }
}

impl Rtc for SimulatedRtc {
    fn read_time(&mut self) -> Result<WallTime, Box<dyn std::error::Error + Send + Sync>> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| error::HwError::I2c(e.to_string()))?
            .as_secs();
        let hour = ((secs / 3_600) % 24) as u8;
        let minute = ((secs / 60) % 60) as u8;
        WallTime::new(hour, minute).map_err(Into::into)
    }
}
