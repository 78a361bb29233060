//! Service dispatcher
//!
//! The single entry point for every kernel service. Each request is routed
//! to exactly one handler; output fields are written back through the
//! request's borrows and the handler's answer is the `u16` result.
//!
//! Only IO_IN_KEY in wait mode blocks. Every other handler returns
//! immediately, and nothing is ever retried.

use nanos_driver_traits::{bcd_to_int, Platform};
use nanos_syscall::error::result_code;
use nanos_syscall::{CursorMode, FsError, KeyMode, Request, Service};

use crate::kernel::Kernel;

/// Added to the two-digit RTC year
const CENTURY: u16 = 2000;

impl<P: Platform> Service for Kernel<P> {
    fn service(&mut self, request: Request<'_>) -> u16 {
        match request {
            // ================================================================
            // Console/IO
            // ================================================================
            Request::GetScreenSize { width, height } => {
                *width = self.config.screen_width;
                *height = self.config.screen_height;
                0
            }
            Request::ClearScreen => {
                self.platform.clear_screen();
                0
            }
            Request::OutChar(c) => {
                self.platform.out_char(c);
                0
            }
            Request::OutCharAttr(ca) => {
                self.platform.out_char_attr(ca.x, ca.y, ca.c, ca.attr);
                0
            }
            Request::SetCursorPos(pos) => {
                self.platform.set_cursor_pos(pos.x, pos.y);
                0
            }
            Request::GetCursorPos { x, y } => {
                (*x, *y) = self.platform.cursor_pos();
                0
            }
            Request::SetShowCursor(mode) => {
                self.platform.set_cursor_visible(mode == CursorMode::Show);
                0
            }
            Request::InKey(mode) => loop {
                let key = self.platform.poll_key();
                if key != 0 || mode == KeyMode::Poll {
                    break key;
                }
                core::hint::spin_loop();
            },
            Request::OutCharSerial(c) => {
                self.platform.serial_write(c);
                0
            }
            Request::InCharSerial => self.platform.serial_read() as u16,
            Request::OutCharDebug(c) => {
                if self.config.serial_debug {
                    self.platform.serial_write(c);
                }
                0
            }

            // ================================================================
            // Filesystem
            // ================================================================
            Request::FsGetInfo { disk_index, info } => result_code(self.platform.info(disk_index, info)),
            Request::FsGetEntry { path, parent, disk, entry } => {
                result_code(self.platform.get_entry(path, parent, disk, entry))
            }
            Request::FsReadFile { path, offset, buffer } => {
                result_code(self.platform.read_file(path, offset, buffer))
            }
            Request::FsWriteFile { path, offset, buffer, flags } => {
                result_code(self.platform.write_file(path, offset, buffer, flags))
            }
            Request::FsMove { src, dst } => result_code(self.platform.move_entry(src, dst)),
            Request::FsCopy { src, dst } => result_code(self.platform.copy_entry(src, dst)),
            Request::FsDelete { path } => result_code(self.platform.delete(path)),
            Request::FsCreateDirectory { path } => result_code(self.platform.create_directory(path)),
            Request::FsList { path, index, entry } => result_code(self.platform.list(path, index, entry)),
            Request::FsFormat { disk } => result_code(self.platform.format(disk)),

            // ================================================================
            // Memory
            // ================================================================
            Request::MemAllocate { size } => self
                .heap
                .allocate(size as usize)
                .map_or(0, |block| block.address()),
            Request::MemFree { address } => {
                self.heap.free(address);
                0
            }
            Request::FarAllocate(lm) => {
                lm.address = self.far.allocate(lm.n).unwrap_or(0);
                0
            }
            Request::FarFree { address } => {
                self.far.free(address);
                0
            }
            Request::FarGetByte { address } => self.platform.far_read(address) as u16,
            Request::FarSetByte { address, value } => {
                self.platform.far_write(address, value);
                0
            }

            // ================================================================
            // Clock
            // ================================================================
            Request::ClkGetTime(t) => {
                let bcd = self.platform.read_rtc();
                t.hour = bcd_to_int(bcd.time[0]);
                t.minute = bcd_to_int(bcd.time[1]);
                t.second = bcd_to_int(bcd.time[2]);
                t.year = bcd_to_int(bcd.date[0]) + CENTURY;
                t.month = bcd_to_int(bcd.date[1]);
                t.day = bcd_to_int(bcd.date[2]);
                0
            }

            Request::Malformed(op) => {
                log::debug!("service {:#06x}: path is not valid UTF-8", op);
                FsError::Invalid.code()
            }
            Request::Unsupported(op) => {
                log::trace!("unsupported service {:#06x}", op);
                0
            }
        }
    }
}
