//! Kernel context
//!
//! One [`Kernel`] owns every dynamically managed byte of the machine: the
//! block heap, the far region table, and the platform the requests are
//! routed to. Nothing here is global; the bare-metal binary keeps its
//! single instance behind a lock.

use log::LevelFilter;
use nanos_driver_traits::Platform;
use nanos_mem::{BlockHeap, RegionTable};

use crate::config::KernelConfig;

/// Run-time switches reachable from the shell
pub trait KernelControl {
    fn serial_debug(&self) -> bool;
    fn set_serial_debug(&mut self, enabled: bool);

    /// BIOS drive id of the boot disk
    fn system_disk(&self) -> u16;

    /// Serial line status; bit 7 set means the port reported an error
    fn serial_status(&self) -> u8;
}

/// Kernel state
pub struct Kernel<P: Platform> {
    pub(crate) heap: BlockHeap,
    pub(crate) far: RegionTable,
    pub(crate) platform: P,
    pub(crate) config: KernelConfig,
}

impl<P: Platform> Kernel<P> {
    /// Fresh kernel: every heap block free, no far regions
    pub fn new(platform: P, config: KernelConfig) -> Self {
        Kernel {
            heap: BlockHeap::default(),
            far: RegionTable::new(),
            platform,
            config,
        }
    }

    /// Bring the screen to a known state and announce ourselves
    pub fn boot(&mut self) {
        apply_log_level(self.config.serial_debug);
        self.platform.set_cursor_visible(true);
        self.platform.clear_screen();
        for &c in b"Starting...\n\r" {
            self.platform.out_char(c);
        }
        log::info!("Starting...");
    }

    pub fn heap(&self) -> &BlockHeap {
        &self.heap
    }

    pub fn far(&self) -> &RegionTable {
        &self.far
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}

impl<P: Platform> KernelControl for Kernel<P> {
    fn serial_debug(&self) -> bool {
        self.config.serial_debug
    }

    fn set_serial_debug(&mut self, enabled: bool) {
        self.config.serial_debug = enabled;
        apply_log_level(enabled);
    }

    fn system_disk(&self) -> u16 {
        self.config.system_disk
    }

    fn serial_status(&self) -> u8 {
        self.platform.line_status()
    }
}

/// Log records only reach the serial port while serial debug is on
pub(crate) fn apply_log_level(serial_debug: bool) {
    log::set_max_level(if serial_debug { LevelFilter::Trace } else { LevelFilter::Off });
}
