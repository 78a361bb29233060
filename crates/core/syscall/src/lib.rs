//! NANOS16 System Call Interface
//!
//! This crate provides the canonical system call definitions for NANOS16.
//! It's used by both the kernel and programs to ensure consistency in the
//! service ABI.
//!
//! A service call is an opcode plus one parameter record whose shape is
//! fixed by the opcode. Inside Rust the pair is the closed [`Request`] enum;
//! the untyped `(opcode, pointer)` form only exists at the raw boundary
//! (see [`raw`]) and is decoded exactly once.

#![cfg_attr(all(feature = "no-std", not(test)), no_std)]

pub mod error;
pub mod io;
pub mod raw;
pub mod syscalls;
pub mod types;

pub use error::{FsError, FsResult};
pub use types::{CharAttr, CursorMode, FarMemRecord, FsEntry, FsInfo, KeyMode, Position, Time};

/// NANOS16 System Call Numbers - AUTHORITATIVE DEFINITION
pub mod numbers {
    // Console/IO
    pub const SYSCALL_IO_GET_SCREEN_SIZE: u16 = 0x00;
    pub const SYSCALL_IO_CLEAR_SCREEN: u16 = 0x01;
    pub const SYSCALL_IO_OUT_CHAR: u16 = 0x02;
    pub const SYSCALL_IO_OUT_CHAR_ATTR: u16 = 0x03;
    pub const SYSCALL_IO_SET_CURSOR_POS: u16 = 0x04;
    pub const SYSCALL_IO_GET_CURSOR_POS: u16 = 0x05;
    pub const SYSCALL_IO_SET_SHOW_CURSOR: u16 = 0x06;
    pub const SYSCALL_IO_IN_KEY: u16 = 0x07;
    pub const SYSCALL_IO_OUT_CHAR_SERIAL: u16 = 0x08;
    pub const SYSCALL_IO_IN_CHAR_SERIAL: u16 = 0x09;
    pub const SYSCALL_IO_OUT_CHAR_DEBUG: u16 = 0x0A;

    // Filesystem
    pub const SYSCALL_FS_GET_INFO: u16 = 0x10;
    pub const SYSCALL_FS_GET_ENTRY: u16 = 0x11;
    pub const SYSCALL_FS_READ_FILE: u16 = 0x12;
    pub const SYSCALL_FS_WRITE_FILE: u16 = 0x13;
    pub const SYSCALL_FS_MOVE: u16 = 0x14;
    pub const SYSCALL_FS_COPY: u16 = 0x15;
    pub const SYSCALL_FS_DELETE: u16 = 0x16;
    pub const SYSCALL_FS_CREATE_DIRECTORY: u16 = 0x17;
    pub const SYSCALL_FS_LIST: u16 = 0x18;
    pub const SYSCALL_FS_FORMAT: u16 = 0x19;

    // Memory
    pub const SYSCALL_MEM_ALLOCATE: u16 = 0x20;
    pub const SYSCALL_MEM_FREE: u16 = 0x21;
    pub const SYSCALL_FAR_ALLOCATE: u16 = 0x22;
    pub const SYSCALL_FAR_FREE: u16 = 0x23;
    pub const SYSCALL_FAR_GET_BYTE: u16 = 0x24;
    pub const SYSCALL_FAR_SET_BYTE: u16 = 0x25;

    // Clock
    pub const SYSCALL_CLK_GET_TIME: u16 = 0x30;

    // Storage results at or above ERROR_ANY are errors
    pub const ERROR_ANY: u16 = 0xFFF0;
    pub const ERROR_NOT_FOUND: u16 = 0xFFF1;
    pub const ERROR_EXISTS: u16 = 0xFFF2;
    pub const ERROR_IO: u16 = 0xFFF3;
    pub const ERROR_NO_SPACE: u16 = 0xFFF4;
    pub const ERROR_INVALID: u16 = 0xFFF5;

    /// "Unknown" parent or disk for FS_GET_ENTRY
    pub const UNKNOWN_VALUE: u16 = 0xFFFF;

    // Entry flags
    pub const T_DIR: u16 = 1;
    pub const T_FILE: u16 = 2;

    // Filesystem types reported by FS_GET_INFO
    pub const FS_TYPE_UNKNOWN: u16 = 0;
    pub const FS_TYPE_NSFS: u16 = 1;

    // Write flags
    pub const WRITE_FLAG_OVERWRITE: u16 = 0;
    pub const WRITE_FLAG_APPEND: u16 = 1;

    // Low byte of IO_IN_KEY results
    pub const KEY_LO_RETURN: u16 = 0x0D;
    pub const KEY_LO_BACKSPACE: u16 = 0x08;
}

use numbers::*;

/// Service opcodes
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    GetScreenSize = SYSCALL_IO_GET_SCREEN_SIZE,
    ClearScreen = SYSCALL_IO_CLEAR_SCREEN,
    OutChar = SYSCALL_IO_OUT_CHAR,
    OutCharAttr = SYSCALL_IO_OUT_CHAR_ATTR,
    SetCursorPos = SYSCALL_IO_SET_CURSOR_POS,
    GetCursorPos = SYSCALL_IO_GET_CURSOR_POS,
    SetShowCursor = SYSCALL_IO_SET_SHOW_CURSOR,
    InKey = SYSCALL_IO_IN_KEY,
    OutCharSerial = SYSCALL_IO_OUT_CHAR_SERIAL,
    InCharSerial = SYSCALL_IO_IN_CHAR_SERIAL,
    OutCharDebug = SYSCALL_IO_OUT_CHAR_DEBUG,
    FsGetInfo = SYSCALL_FS_GET_INFO,
    FsGetEntry = SYSCALL_FS_GET_ENTRY,
    FsReadFile = SYSCALL_FS_READ_FILE,
    FsWriteFile = SYSCALL_FS_WRITE_FILE,
    FsMove = SYSCALL_FS_MOVE,
    FsCopy = SYSCALL_FS_COPY,
    FsDelete = SYSCALL_FS_DELETE,
    FsCreateDirectory = SYSCALL_FS_CREATE_DIRECTORY,
    FsList = SYSCALL_FS_LIST,
    FsFormat = SYSCALL_FS_FORMAT,
    MemAllocate = SYSCALL_MEM_ALLOCATE,
    MemFree = SYSCALL_MEM_FREE,
    FarAllocate = SYSCALL_FAR_ALLOCATE,
    FarFree = SYSCALL_FAR_FREE,
    FarGetByte = SYSCALL_FAR_GET_BYTE,
    FarSetByte = SYSCALL_FAR_SET_BYTE,
    ClkGetTime = SYSCALL_CLK_GET_TIME,
}

impl TryFrom<u16> for Opcode {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let op = match value {
            SYSCALL_IO_GET_SCREEN_SIZE => Opcode::GetScreenSize,
            SYSCALL_IO_CLEAR_SCREEN => Opcode::ClearScreen,
            SYSCALL_IO_OUT_CHAR => Opcode::OutChar,
            SYSCALL_IO_OUT_CHAR_ATTR => Opcode::OutCharAttr,
            SYSCALL_IO_SET_CURSOR_POS => Opcode::SetCursorPos,
            SYSCALL_IO_GET_CURSOR_POS => Opcode::GetCursorPos,
            SYSCALL_IO_SET_SHOW_CURSOR => Opcode::SetShowCursor,
            SYSCALL_IO_IN_KEY => Opcode::InKey,
            SYSCALL_IO_OUT_CHAR_SERIAL => Opcode::OutCharSerial,
            SYSCALL_IO_IN_CHAR_SERIAL => Opcode::InCharSerial,
            SYSCALL_IO_OUT_CHAR_DEBUG => Opcode::OutCharDebug,
            SYSCALL_FS_GET_INFO => Opcode::FsGetInfo,
            SYSCALL_FS_GET_ENTRY => Opcode::FsGetEntry,
            SYSCALL_FS_READ_FILE => Opcode::FsReadFile,
            SYSCALL_FS_WRITE_FILE => Opcode::FsWriteFile,
            SYSCALL_FS_MOVE => Opcode::FsMove,
            SYSCALL_FS_COPY => Opcode::FsCopy,
            SYSCALL_FS_DELETE => Opcode::FsDelete,
            SYSCALL_FS_CREATE_DIRECTORY => Opcode::FsCreateDirectory,
            SYSCALL_FS_LIST => Opcode::FsList,
            SYSCALL_FS_FORMAT => Opcode::FsFormat,
            SYSCALL_MEM_ALLOCATE => Opcode::MemAllocate,
            SYSCALL_MEM_FREE => Opcode::MemFree,
            SYSCALL_FAR_ALLOCATE => Opcode::FarAllocate,
            SYSCALL_FAR_FREE => Opcode::FarFree,
            SYSCALL_FAR_GET_BYTE => Opcode::FarGetByte,
            SYSCALL_FAR_SET_BYTE => Opcode::FarSetByte,
            SYSCALL_CLK_GET_TIME => Opcode::ClkGetTime,
            other => return Err(other),
        };
        Ok(op)
    }
}

/// A decoded service request
///
/// Output fields are `&mut` borrows of the caller's record: the handler
/// writes them in place, the `u16` result of [`Service::service`] carries
/// everything else.
#[derive(Debug)]
pub enum Request<'a> {
    // Console/IO
    GetScreenSize { width: &'a mut u16, height: &'a mut u16 },
    ClearScreen,
    OutChar(u8),
    OutCharAttr(CharAttr),
    SetCursorPos(Position),
    GetCursorPos { x: &'a mut u16, y: &'a mut u16 },
    SetShowCursor(CursorMode),
    InKey(KeyMode),
    OutCharSerial(u8),
    InCharSerial,
    OutCharDebug(u8),

    // Filesystem
    FsGetInfo { disk_index: u16, info: &'a mut FsInfo },
    FsGetEntry { path: &'a str, parent: u16, disk: u16, entry: &'a mut FsEntry },
    FsReadFile { path: &'a str, offset: u16, buffer: &'a mut [u8] },
    FsWriteFile { path: &'a str, offset: u16, buffer: &'a [u8], flags: u16 },
    FsMove { src: &'a str, dst: &'a str },
    FsCopy { src: &'a str, dst: &'a str },
    FsDelete { path: &'a str },
    FsCreateDirectory { path: &'a str },
    FsList { path: &'a str, index: u16, entry: &'a mut FsEntry },
    FsFormat { disk: u16 },

    // Memory
    MemAllocate { size: u16 },
    MemFree { address: u16 },
    FarAllocate(&'a mut FarMemRecord),
    FarFree { address: u32 },
    FarGetByte { address: u32 },
    FarSetByte { address: u32, value: u8 },

    // Clock
    ClkGetTime(&'a mut Time),

    /// Opcode with no handler; always answers 0
    Unsupported(u16),

    /// Storage opcode whose path is not valid UTF-8; answers `ERROR_INVALID`
    Malformed(u16),
}

impl Request<'_> {
    /// Raw opcode number of this request
    pub fn opcode(&self) -> u16 {
        let op = match self {
            Request::GetScreenSize { .. } => Opcode::GetScreenSize,
            Request::ClearScreen => Opcode::ClearScreen,
            Request::OutChar(_) => Opcode::OutChar,
            Request::OutCharAttr(_) => Opcode::OutCharAttr,
            Request::SetCursorPos(_) => Opcode::SetCursorPos,
            Request::GetCursorPos { .. } => Opcode::GetCursorPos,
            Request::SetShowCursor(_) => Opcode::SetShowCursor,
            Request::InKey(_) => Opcode::InKey,
            Request::OutCharSerial(_) => Opcode::OutCharSerial,
            Request::InCharSerial => Opcode::InCharSerial,
            Request::OutCharDebug(_) => Opcode::OutCharDebug,
            Request::FsGetInfo { .. } => Opcode::FsGetInfo,
            Request::FsGetEntry { .. } => Opcode::FsGetEntry,
            Request::FsReadFile { .. } => Opcode::FsReadFile,
            Request::FsWriteFile { .. } => Opcode::FsWriteFile,
            Request::FsMove { .. } => Opcode::FsMove,
            Request::FsCopy { .. } => Opcode::FsCopy,
            Request::FsDelete { .. } => Opcode::FsDelete,
            Request::FsCreateDirectory { .. } => Opcode::FsCreateDirectory,
            Request::FsList { .. } => Opcode::FsList,
            Request::FsFormat { .. } => Opcode::FsFormat,
            Request::MemAllocate { .. } => Opcode::MemAllocate,
            Request::MemFree { .. } => Opcode::MemFree,
            Request::FarAllocate(_) => Opcode::FarAllocate,
            Request::FarFree { .. } => Opcode::FarFree,
            Request::FarGetByte { .. } => Opcode::FarGetByte,
            Request::FarSetByte { .. } => Opcode::FarSetByte,
            Request::ClkGetTime(_) => Opcode::ClkGetTime,
            Request::Unsupported(op) | Request::Malformed(op) => return *op,
        };
        op as u16
    }
}

/// Anything that answers service requests
///
/// The kernel implements this as the dispatcher; programs reach it through
/// whatever `Service` they are handed at entry.
pub trait Service {
    fn service(&mut self, request: Request<'_>) -> u16;
}

impl<S: Service + ?Sized> Service for &mut S {
    fn service(&mut self, request: Request<'_>) -> u16 {
        (**self).service(request)
    }
}
