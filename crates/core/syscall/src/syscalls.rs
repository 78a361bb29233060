//! High-level syscall wrappers
//!
//! The program runtime library: each wrapper packs its arguments into a
//! [`Request`] and hands it to whatever [`Service`] the program was given.

use crate::error::{FsError, FsResult};
use crate::numbers::UNKNOWN_VALUE;
use crate::types::{CharAttr, CursorMode, FarMemRecord, FsEntry, FsInfo, KeyMode, Position, Time};
use crate::{Request, Service};

// ============================================================================
// Memory
// ============================================================================

/// Allocate `size` bytes of heap memory, `None` when the heap is exhausted
pub fn malloc<S: Service + ?Sized>(sys: &mut S, size: u16) -> Option<u16> {
    match sys.service(Request::MemAllocate { size }) {
        0 => None,
        address => Some(address),
    }
}

/// Free a heap allocation
pub fn mfree<S: Service + ?Sized>(sys: &mut S, address: u16) {
    sys.service(Request::MemFree { address });
}

/// Allocate `size` bytes of far memory
pub fn lmalloc<S: Service + ?Sized>(sys: &mut S, size: u32) -> Option<u32> {
    let mut lm = FarMemRecord { address: 0, n: size };
    sys.service(Request::FarAllocate(&mut lm));
    match lm.address {
        0 => None,
        address => Some(address),
    }
}

/// Free a far allocation
pub fn lmfree<S: Service + ?Sized>(sys: &mut S, address: u32) {
    sys.service(Request::FarFree { address });
}

pub fn lmem_getbyte<S: Service + ?Sized>(sys: &mut S, address: u32) -> u8 {
    sys.service(Request::FarGetByte { address }) as u8
}

pub fn lmem_setbyte<S: Service + ?Sized>(sys: &mut S, address: u32, value: u8) {
    sys.service(Request::FarSetByte { address, value });
}

/// Copy `size` far bytes from `src` to `dst`
///
/// Overlapping ranges are handled: the copy runs backwards when `dst` lies
/// above `src`. Returns the number of bytes copied.
pub fn lmemcpy<S: Service + ?Sized>(sys: &mut S, dst: u32, src: u32, size: u32) -> u32 {
    let backwards = src <= dst;
    for i in 0..size {
        let c = if backwards { size - 1 - i } else { i };
        let value = lmem_getbyte(sys, src.wrapping_add(c));
        lmem_setbyte(sys, dst.wrapping_add(c), value);
    }
    size
}

/// Fill `size` far bytes at `dst` with `value`
pub fn lmemset<S: Service + ?Sized>(sys: &mut S, dst: u32, value: u8, size: u32) -> u32 {
    for i in 0..size {
        lmem_setbyte(sys, dst.wrapping_add(i), value);
    }
    size
}

// ============================================================================
// Console/IO
// ============================================================================

/// Screen size in character cells, `(width, height)`
pub fn get_screen_size<S: Service + ?Sized>(sys: &mut S) -> (u16, u16) {
    let (mut width, mut height) = (0, 0);
    sys.service(Request::GetScreenSize { width: &mut width, height: &mut height });
    (width, height)
}

pub fn clear_screen<S: Service + ?Sized>(sys: &mut S) {
    sys.service(Request::ClearScreen);
}

pub fn putchar<S: Service + ?Sized>(sys: &mut S, c: u8) {
    sys.service(Request::OutChar(c));
}

/// Draw a character with a color attribute at a screen cell
pub fn putchar_attr<S: Service + ?Sized>(sys: &mut S, x: u16, y: u16, c: u8, attr: u8) {
    sys.service(Request::OutCharAttr(CharAttr { x, y, c, attr }));
}

pub fn get_cursor_position<S: Service + ?Sized>(sys: &mut S) -> Position {
    let mut pos = Position::default();
    sys.service(Request::GetCursorPos { x: &mut pos.x, y: &mut pos.y });
    pos
}

pub fn set_cursor_position<S: Service + ?Sized>(sys: &mut S, x: u16, y: u16) {
    sys.service(Request::SetCursorPos(Position { x, y }));
}

pub fn set_show_cursor<S: Service + ?Sized>(sys: &mut S, mode: CursorMode) {
    sys.service(Request::SetShowCursor(mode));
}

/// Read a key; with `KeyMode::Poll` returns 0 when no key is pending
pub fn getkey<S: Service + ?Sized>(sys: &mut S, mode: KeyMode) -> u16 {
    sys.service(Request::InKey(mode))
}

/// Wait for a key and return its low byte
pub fn getchar<S: Service + ?Sized>(sys: &mut S) -> u8 {
    (getkey(sys, KeyMode::Wait) & 0x00FF) as u8
}

pub fn sputchar<S: Service + ?Sized>(sys: &mut S, c: u8) {
    sys.service(Request::OutCharSerial(c));
}

pub fn sgetchar<S: Service + ?Sized>(sys: &mut S) -> u8 {
    sys.service(Request::InCharSerial) as u8
}

/// Character on the debug channel, dropped unless serial debug is enabled
pub fn debugchar<S: Service + ?Sized>(sys: &mut S, c: u8) {
    sys.service(Request::OutCharDebug(c));
}

// ============================================================================
// Filesystem
// ============================================================================

/// Disk information for `disk_index`
pub fn get_fsinfo<S: Service + ?Sized>(sys: &mut S, disk_index: u16) -> FsResult<FsInfo> {
    let mut info = FsInfo::default();
    FsError::check(sys.service(Request::FsGetInfo { disk_index, info: &mut info }))?;
    Ok(info)
}

/// Resolve `path`; parent and disk are derived from the path
pub fn get_entry<S: Service + ?Sized>(sys: &mut S, path: &str) -> FsResult<FsEntry> {
    let mut entry = FsEntry::default();
    FsError::check(sys.service(Request::FsGetEntry {
        path,
        parent: UNKNOWN_VALUE,
        disk: UNKNOWN_VALUE,
        entry: &mut entry,
    }))?;
    Ok(entry)
}

/// Read up to `buffer.len()` bytes at `offset`; returns the bytes read
pub fn read_file<S: Service + ?Sized>(sys: &mut S, path: &str, offset: u16, buffer: &mut [u8]) -> FsResult<u16> {
    FsError::check(sys.service(Request::FsReadFile { path, offset, buffer }))
}

/// Write `buffer` at `offset`; returns the bytes written
pub fn write_file<S: Service + ?Sized>(
    sys: &mut S,
    path: &str,
    offset: u16,
    buffer: &[u8],
    flags: u16,
) -> FsResult<u16> {
    FsError::check(sys.service(Request::FsWriteFile { path, offset, buffer, flags }))
}

pub fn move_entry<S: Service + ?Sized>(sys: &mut S, src: &str, dst: &str) -> FsResult<u16> {
    FsError::check(sys.service(Request::FsMove { src, dst }))
}

pub fn copy_entry<S: Service + ?Sized>(sys: &mut S, src: &str, dst: &str) -> FsResult<u16> {
    FsError::check(sys.service(Request::FsCopy { src, dst }))
}

pub fn delete<S: Service + ?Sized>(sys: &mut S, path: &str) -> FsResult<u16> {
    FsError::check(sys.service(Request::FsDelete { path }))
}

pub fn create_directory<S: Service + ?Sized>(sys: &mut S, path: &str) -> FsResult<u16> {
    FsError::check(sys.service(Request::FsCreateDirectory { path }))
}

/// Fetch entry `index` of directory `path`
///
/// Returns the number of entries in the directory; `entry` is only
/// meaningful when `index` is below that count.
pub fn list<S: Service + ?Sized>(sys: &mut S, path: &str, index: u16, entry: &mut FsEntry) -> FsResult<u16> {
    FsError::check(sys.service(Request::FsList { path, index, entry }))
}

pub fn format<S: Service + ?Sized>(sys: &mut S, disk: u16) -> FsResult<u16> {
    FsError::check(sys.service(Request::FsFormat { disk }))
}

// ============================================================================
// Clock
// ============================================================================

pub fn time<S: Service + ?Sized>(sys: &mut S) -> Time {
    let mut t = Time::default();
    sys.service(Request::ClkGetTime(&mut t));
    t
}
