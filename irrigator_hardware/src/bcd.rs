//! Packed binary-coded-decimal decoding for DS1307-class RTC registers.
//!
//! Register map (first three bytes of a 7-byte burst read from 0x00):
//! seconds, minutes, hours. The date registers that follow are ignored;
//! scheduling in this appliance is hour/minute only.

/// Decode one packed BCD byte: high nibble is tens, low nibble is units.
#[inline]
pub fn bcd_to_dec(b: u8) -> u8 {
    (b >> 4) * 10 + (b & 0x0F)
}

/// Decode the minutes register. Bit 7 is undefined on some parts and masked.
#[inline]
pub fn decode_minute(reg: u8) -> u8 {
    bcd_to_dec(reg & 0x7F)
}

/// Decode the hours register in 24-hour mode. Bits 6..7 carry the 12/24h
/// mode flags and are masked.
#[inline]
pub fn decode_hour(reg: u8) -> u8 {
    bcd_to_dec(reg & 0x3F)
}
