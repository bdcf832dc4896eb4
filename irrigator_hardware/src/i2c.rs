//! Real I2C devices: the relay unit and the DS1307-class RTC.
//!
//! Only built with the `hardware` feature on Linux (rppal).

use crate::bcd::{decode_hour, decode_minute};
use crate::error::HwError;
use irrigator_traits::WallTime;
use rppal::i2c::I2c;

const RELAY_CMD_ON: u8 = 0x01;
const RELAY_CMD_OFF: u8 = 0x00;

/// Single-channel I2C relay unit. One command byte: 0x01 on, 0x00 off.
pub struct I2cRelay {
    i2c: I2c,
    addr: u16,
}

impl I2cRelay {
    pub fn new(bus: u8, addr: u8) -> Result<Self, HwError> {
        let i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(Self {
            i2c,
            addr: addr as u16,
        })
    }

    fn write_cmd(&mut self, cmd: u8) -> Result<(), HwError> {
        self.i2c
            .set_slave_address(self.addr)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        self.i2c
            .write(&[cmd])
            .map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(())
    }
}

impl irrigator_traits::Relay for I2cRelay {
    fn on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!("relay on");
        self.write_cmd(RELAY_CMD_ON).map_err(Into::into)
    }

    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!("relay off");
        self.write_cmd(RELAY_CMD_OFF).map_err(Into::into)
    }
}

/// DS1307-class real-time clock read over I2C.
pub struct I2cRtc {
    i2c: I2c,
    addr: u16,
}

impl I2cRtc {
    pub fn new(bus: u8, addr: u8) -> Result<Self, HwError> {
        let i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(Self {
            i2c,
            addr: addr as u16,
        })
    }

    fn read_registers(&mut self) -> Result<WallTime, HwError> {
        self.i2c
            .set_slave_address(self.addr)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        // Burst-read seconds..year; only minutes and hours are used.
        let mut regs = [0u8; 7];
        self.i2c
            .write_read(&[0x00], &mut regs)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        let minute = decode_minute(regs[1]);
        let hour = decode_hour(regs[2]);
        WallTime::new(hour, minute).map_err(|_| HwError::InvalidTime { hour, minute })
    }
}

impl irrigator_traits::Rtc for I2cRtc {
    fn read_time(&mut self) -> Result<WallTime, Box<dyn std::error::Error + Send + Sync>> {
        let t = self.read_registers()?;
        tracing::trace!(%t, "rtc read");
        Ok(t)
    }
}
