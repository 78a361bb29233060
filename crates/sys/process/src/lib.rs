//! Program Loading for NANOS16
//!
//! Finds a named executable through the storage requests, reads it into the
//! fixed program slot and runs it as the single foreground task. There is
//! no protection: the program shares the whole address space and both
//! allocator tables with the kernel.
//!
//! Everything goes through a [`Service`], the loader never talks to the
//! filesystem engine directly.

#![cfg_attr(not(test), no_std)]

use core::fmt;

use nanos_mem::PROGRAM_MAX_SIZE;
use nanos_syscall::syscalls::{get_entry, read_file, set_show_cursor};
use nanos_syscall::{CursorMode, Service};

/// Extension of executable images
pub const PROGRAM_EXT: &str = ".bin";

/// Capacity of the program name buffer, terminator included
pub const NAME_CAPACITY: usize = 32;

/// Program loading errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// Missing, not a file, unreadable or empty
    UnknownCommand,
    /// Found and read, but not a `.bin` image
    NotExecutable,
}

impl LoadError {
    /// Text the shell prints for this error
    pub fn message(&self) -> &'static str {
        match self {
            LoadError::UnknownCommand => "unknown command",
            LoadError::NotExecutable => "error: only .bin files can be executed",
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Bounded program file name
///
/// Holds at most `NAME_CAPACITY - 1` bytes; a name with no `.` gets
/// `PROGRAM_EXT` appended if it still fits.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ProgramName {
    buf: [u8; NAME_CAPACITY - 1],
    len: usize,
}

impl ProgramName {
    pub fn resolve(command: &str) -> Self {
        let mut name = ProgramName { buf: [0; NAME_CAPACITY - 1], len: 0 };
        name.push_bounded(command);
        if !name.as_str().contains('.') {
            name.push_bounded(PROGRAM_EXT);
        }
        name
    }

    fn push_bounded(&mut self, s: &str) {
        let room = self.buf.len() - self.len;
        let mut take = s.len().min(room);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
    }

    pub fn as_str(&self) -> &str {
        // Only whole characters are ever copied in
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    /// The text from the first `.` to the end is exactly `PROGRAM_EXT`
    pub fn is_executable(&self) -> bool {
        let name = self.as_str();
        name.find('.').map_or(false, |dot| &name[dot..] == PROGRAM_EXT)
    }
}

impl fmt::Debug for ProgramName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for ProgramName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A program image sitting in the slot
#[derive(Debug, Clone, Copy)]
pub struct LoadedProgram {
    pub name: ProgramName,
    /// Size declared by the directory entry
    pub declared_size: u16,
    /// Bytes actually read into the slot
    pub len: usize,
}

/// How control is transferred to a loaded image
pub trait EntryPoint {
    /// Run `image` with `args` (`args[0]` is the command name)
    ///
    /// `services` is the kernel the program may call back into. Returns the
    /// program's exit value.
    fn call(&mut self, image: &[u8], args: &[&str], services: &mut dyn Service) -> u16;
}

/// Loader over the fixed program slot
pub struct ProgramLoader<'s> {
    slot: &'s mut [u8],
}

impl<'s> ProgramLoader<'s> {
    /// Wrap the program slot; only the first `PROGRAM_MAX_SIZE` bytes are used
    pub fn new(slot: &'s mut [u8]) -> Self {
        ProgramLoader { slot }
    }

    /// The slot contents
    pub fn slot(&self) -> &[u8] {
        self.slot
    }

    /// Find `command` and read it into the slot
    pub fn load(&mut self, sys: &mut dyn Service, command: &str) -> LoadResult<LoadedProgram> {
        let name = ProgramName::resolve(command);

        let entry = match get_entry(sys, name.as_str()) {
            Ok(entry) if entry.is_file() => entry,
            Ok(_) => {
                log::debug!("CLI: {} is not a file", name);
                return Err(LoadError::UnknownCommand);
            }
            Err(err) => {
                log::debug!("CLI: {} not found ({})", name, err);
                return Err(LoadError::UnknownCommand);
            }
        };

        let count = (entry.size as usize).min(PROGRAM_MAX_SIZE).min(self.slot.len());
        let len = match read_file(sys, name.as_str(), 0, &mut self.slot[..count]) {
            Ok(0) => {
                log::debug!("CLI: {} is empty", name);
                return Err(LoadError::UnknownCommand);
            }
            Ok(n) => n as usize,
            Err(err) => {
                log::debug!("CLI: {} read failed ({})", name, err);
                return Err(LoadError::UnknownCommand);
            }
        };

        if !name.is_executable() {
            return Err(LoadError::NotExecutable);
        }

        Ok(LoadedProgram { name, declared_size: entry.size, len: len.min(count) })
    }

    /// Load `args[0]` and run it
    ///
    /// The cursor is shown again once the program returns, since the
    /// program may have hidden it.
    pub fn exec<E: EntryPoint + ?Sized>(
        &mut self,
        sys: &mut dyn Service,
        entry: &mut E,
        args: &[&str],
    ) -> LoadResult<u16> {
        let command = args.first().copied().ok_or(LoadError::UnknownCommand)?;
        let program = self.load(sys, command)?;

        log::debug!("CLI: Running program {} ({} bytes)", program.name, program.declared_size);

        let code = entry.call(&self.slot[..program.len], args, &mut *sys);
        set_show_cursor(sys, CursorMode::Show);
        Ok(code)
    }
}
