//! Formatted output and line input for programs
//!
//! `write!` works on any of the three output channels:
//!
//! ```rust,ignore
//! use core::fmt::Write;
//! write!(Screen(&mut sys), "{} bytes\n\r", n)?;
//! ```

use core::fmt;

use crate::numbers::{KEY_LO_BACKSPACE, KEY_LO_RETURN};
use crate::syscalls::{debugchar, getchar, putchar, sputchar};
use crate::Service;

/// The screen, through IO_OUT_CHAR
pub struct Screen<'a, S: Service + ?Sized>(pub &'a mut S);

/// The serial port, through IO_OUT_CHAR_SERIAL
pub struct SerialOut<'a, S: Service + ?Sized>(pub &'a mut S);

/// The debug channel, through IO_OUT_CHAR_DEBUG
pub struct DebugOut<'a, S: Service + ?Sized>(pub &'a mut S);

impl<S: Service + ?Sized> fmt::Write for Screen<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            putchar(self.0, b);
        }
        Ok(())
    }
}

impl<S: Service + ?Sized> fmt::Write for SerialOut<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            sputchar(self.0, b);
        }
        Ok(())
    }
}

impl<S: Service + ?Sized> fmt::Write for DebugOut<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            debugchar(self.0, b);
        }
        Ok(())
    }
}

/// Read a line from the keyboard into `buf`, echoing to the screen
///
/// Printable characters (32..=126) are stored while they fit, always
/// leaving room for a terminating NUL. Backspace erases the last character.
/// Return ends the line and echoes `\n\r`. Returns the number of characters
/// stored; `buf[len]` is NUL when `buf` is not empty.
pub fn getstr<S: Service + ?Sized>(sys: &mut S, buf: &mut [u8]) -> usize {
    let mut len = 0;

    loop {
        let c = getchar(sys);
        if c as u16 == KEY_LO_RETURN {
            putchar(sys, b'\n');
            putchar(sys, b'\r');
            break;
        }
        if c as u16 == KEY_LO_BACKSPACE {
            if len > 0 {
                len -= 1;
                buf[len] = 0;
                putchar(sys, KEY_LO_BACKSPACE as u8);
                putchar(sys, 0);
                putchar(sys, KEY_LO_BACKSPACE as u8);
            }
        } else if (32..=126).contains(&c) && len + 1 < buf.len() {
            buf[len] = c;
            putchar(sys, c);
            len += 1;
        }
    }

    if let Some(terminator) = buf.get_mut(len) {
        *terminator = 0;
    }
    len
}

/// [`getstr`], returning the line as text
pub fn read_line<'b, S: Service + ?Sized>(sys: &mut S, buf: &'b mut [u8]) -> &'b str {
    let len = getstr(sys, buf);
    // Only printable ASCII is ever stored
    core::str::from_utf8(&buf[..len]).unwrap_or("")
}
