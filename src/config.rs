//! Kernel configuration
//!
//! Addresses and sizes are fixed at compile time in `nanos_mem::layout`.
//! What remains here can change while the kernel runs.

/// Text mode the screen is set to at boot
pub const DEFAULT_SCREEN_WIDTH: u16 = 80;
pub const DEFAULT_SCREEN_HEIGHT: u16 = 50;

/// BIOS drive id of the first floppy
pub const DEFAULT_SYSTEM_DISK: u16 = 0x00;

/// Run-time kernel settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Reported by IO_GET_SCREEN_SIZE
    pub screen_width: u16,
    pub screen_height: u16,
    /// Debug output (IO_OUT_CHAR_DEBUG and log records) on the serial port
    pub serial_debug: bool,
    /// BIOS drive id the kernel booted from
    pub system_disk: u16,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            serial_debug: cfg!(feature = "debug-kernel"),
            system_disk: DEFAULT_SYSTEM_DISK,
        }
    }
}
