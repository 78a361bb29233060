//! Parameter records exchanged with the kernel
//!
//! Every record is `#[repr(C)]`: the same structs are what a program places
//! in memory before issuing a raw service call.

use crate::numbers::{T_DIR, T_FILE};

/// Screen cell coordinates
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

/// Character with position and color attribute (IO_OUT_CHAR_ATTR)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharAttr {
    pub x: u16,
    pub y: u16,
    pub c: u8,
    /// Low nibble text color, high nibble background
    pub attr: u8,
}

/// Far memory record (FAR_ALLOCATE, FAR_FREE, FAR_GET_BYTE, FAR_SET_BYTE)
///
/// `n` is the size for FAR_ALLOCATE and the byte value for FAR_SET_BYTE.
/// `address` is written back by FAR_ALLOCATE (0 on failure).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FarMemRecord {
    pub address: u32,
    pub n: u32,
}

/// Decoded wall clock time (CLK_GET_TIME)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Time {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

/// Years stored in a packed timestamp count from here
pub const FS_TIME_EPOCH: u16 = 2000;

impl Time {
    /// Unpack a filesystem timestamp
    ///
    /// Bits, high to low: year since `FS_TIME_EPOCH` (6), month (4),
    /// day (5), hour (5), minute (6), second (6).
    pub fn from_fs_time(packed: u32) -> Self {
        let field = |shift: u32, bits: u32| ((packed >> shift) & ((1 << bits) - 1)) as u16;
        Time {
            year: FS_TIME_EPOCH + field(26, 6),
            month: field(22, 4),
            day: field(17, 5),
            hour: field(12, 5),
            minute: field(6, 6),
            second: field(0, 6),
        }
    }

    /// Pack into a filesystem timestamp; out of range fields are masked
    pub fn to_fs_time(&self) -> u32 {
        let field = |value: u16, shift: u32, bits: u32| (u32::from(value) & ((1 << bits) - 1)) << shift;
        field(self.year.saturating_sub(FS_TIME_EPOCH), 26, 6)
            | field(self.month, 22, 4)
            | field(self.day, 17, 5)
            | field(self.hour, 12, 5)
            | field(self.minute, 6, 6)
            | field(self.second, 0, 6)
    }
}

/// Cursor visibility (IO_SET_SHOW_CURSOR)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    Hide,
    Show,
}

impl CursorMode {
    pub const HIDE: u16 = 0;
    pub const SHOW: u16 = 1;

    /// Anything other than HIDE shows the cursor
    pub fn from_raw(mode: u16) -> Self {
        if mode == Self::HIDE {
            CursorMode::Hide
        } else {
            CursorMode::Show
        }
    }

    pub fn to_raw(self) -> u16 {
        match self {
            CursorMode::Hide => Self::HIDE,
            CursorMode::Show => Self::SHOW,
        }
    }
}

/// Keyboard read mode (IO_IN_KEY)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Block until a key is available
    Wait,
    /// Return 0 if no key is available
    Poll,
}

impl KeyMode {
    pub const WAIT: u16 = 0;
    pub const POLL: u16 = 1;

    /// Anything other than WAIT polls
    pub fn from_raw(mode: u16) -> Self {
        if mode == Self::WAIT {
            KeyMode::Wait
        } else {
            KeyMode::Poll
        }
    }

    pub fn to_raw(self) -> u16 {
        match self {
            KeyMode::Wait => Self::WAIT,
            KeyMode::Poll => Self::POLL,
        }
    }
}

/// Maximum entry name length, without terminator
pub const FS_NAME_LEN: usize = 15;

/// Filesystem entry (FS_GET_ENTRY, FS_LIST)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsEntry {
    /// NUL padded name
    pub name: [u8; FS_NAME_LEN + 1],
    /// `T_DIR` / `T_FILE`
    pub flags: u16,
    /// Bytes for files, item count for directories
    pub size: u16,
    /// Last modification, packed (see [`Time::from_fs_time`])
    pub time: u32,
}

impl FsEntry {
    /// Build an entry, truncating the name to `FS_NAME_LEN` bytes
    pub fn new(name: &str, flags: u16, size: u16) -> Self {
        let mut entry = FsEntry { flags, size, ..Default::default() };
        entry.set_name(name);
        entry
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = [0; FS_NAME_LEN + 1];
        copy_bounded(&mut self.name, name.as_bytes());
    }

    /// Name up to the first NUL. Invalid UTF-8 yields an empty name.
    pub fn name(&self) -> &str {
        cstr_prefix(&self.name)
    }

    pub fn modified(&self) -> Time {
        Time::from_fs_time(self.time)
    }

    pub fn is_dir(&self) -> bool {
        self.flags & T_DIR != 0
    }

    pub fn is_file(&self) -> bool {
        self.flags & T_FILE != 0
    }
}

/// Disk/filesystem information (FS_GET_INFO)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsInfo {
    /// Disk name ("fd0", "hd0"...), NUL padded
    pub name: [u8; 4],
    /// BIOS drive id
    pub id: u16,
    /// Filesystem type, 0 if unknown
    pub fs_type: u16,
    /// Filesystem size in blocks
    pub fs_size: u32,
    /// Disk size in MB
    pub disk_size: u32,
}

impl FsInfo {
    pub fn name(&self) -> &str {
        cstr_prefix(&self.name)
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = [0; 4];
        copy_bounded(&mut self.name, name.as_bytes());
    }
}

/// Copy `src` into `dst`, always leaving room for a terminating NUL
///
/// Returns the number of bytes copied.
pub fn copy_bounded(dst: &mut [u8], src: &[u8]) -> usize {
    let n = src.len().min(dst.len().saturating_sub(1));
    dst[..n].copy_from_slice(&src[..n]);
    if n < dst.len() {
        dst[n] = 0;
    }
    n
}

fn cstr_prefix(bytes: &[u8]) -> &str {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..len]).unwrap_or("")
}
