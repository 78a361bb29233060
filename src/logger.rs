//! Serial logger
//!
//! Routes `log` records to the serial port, one byte at a time, through a
//! plain function so that logging never needs the kernel lock.

use core::fmt::{self, Write};

use log::{Log, Metadata, Record, SetLoggerError};

use crate::kernel::apply_log_level;

/// Byte sink the records are written to
pub type Sink = fn(u8);

pub struct SerialLogger {
    sink: Sink,
}

impl SerialLogger {
    pub const fn new(sink: Sink) -> Self {
        SerialLogger { sink }
    }
}

struct SinkWriter(Sink);

impl Write for SinkWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            (self.0)(b);
        }
        Ok(())
    }
}

/// `[LEVEL] target: message\n\r`
pub fn write_record<W: Write>(w: &mut W, record: &Record<'_>) -> fmt::Result {
    write!(w, "[{}] {}: {}\n\r", record.level(), record.target(), record.args())
}

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let _ = write_record(&mut SinkWriter(self.sink), record);
        }
    }

    fn flush(&self) {}
}

/// Install `logger`; records are dropped until serial debug is enabled
pub fn init(logger: &'static SerialLogger, serial_debug: bool) -> Result<(), SetLoggerError> {
    log::set_logger(logger)?;
    apply_log_level(serial_debug);
    Ok(())
}
