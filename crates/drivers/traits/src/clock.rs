//! Real Time Clock Trait

/// Raw RTC reading, every byte BCD encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BcdDateTime {
    /// hour, minute, second
    pub time: [u8; 3],
    /// year within the century, month, day
    pub date: [u8; 3],
}

pub trait Rtc {
    fn read_rtc(&mut self) -> BcdDateTime;
}

/// Decode one BCD byte
#[inline]
pub fn bcd_to_int(b: u8) -> u16 {
    ((b >> 4) as u16) * 10 + (b & 0x0F) as u16
}
