//! Keyboard and Serial Traits
//!
//! Implemented by the BIOS keyboard and serial port layers.

/// Keyboard
pub trait Keyboard {
    /// Poll for a key (non-blocking)
    ///
    /// Returns the BIOS key code, scan code in the high byte and character
    /// in the low byte, or 0 when no key is pending.
    fn poll_key(&mut self) -> u16;
}

/// Serial port (COM1)
pub trait SerialPort {
    fn serial_write(&mut self, c: u8);

    /// Read one character, blocking
    fn serial_read(&mut self) -> u8;

    /// Line status byte as reported at initialization
    ///
    /// Bit 7 is set when the port timed out.
    fn line_status(&self) -> u8;
}
