//! Raw service ABI
//!
//! At the raw boundary a service call is `(opcode, param)` where `param` is
//! an untyped pointer to a `#[repr(C)]` record, a scalar, or, for MEM_FREE,
//! the address itself. The kernel side decodes with [`Request::from_raw`];
//! programs encode with [`RawGate`].
//!
//! Paths are NUL terminated byte strings. Scalar parameters are read as
//! `u16` (`u8` for characters); a null scalar pointer reads as 0. A null
//! record, or a null pointer inside a record, decodes to
//! `Request::Unsupported`. A path that is not valid UTF-8 decodes to
//! `Request::Malformed`.

use core::ffi::{c_char, CStr};
use core::ptr;

use crate::types::{copy_bounded, CharAttr, CursorMode, FarMemRecord, FsEntry, FsInfo, KeyMode, Position, Time};
use crate::{Opcode, Request, Service};

/// Size of the NUL terminated path buffers built by [`RawGate`]
pub const PATH_BUFFER_SIZE: usize = 72;

/// IO_GET_SCREEN_SIZE, IO_SET_CURSOR_POS, IO_GET_CURSOR_POS
#[repr(C)]
#[derive(Debug)]
pub struct RawPosition {
    pub x: u16,
    pub y: u16,
    pub px: *mut u16,
    pub py: *mut u16,
}

/// FS_GET_INFO
#[repr(C)]
#[derive(Debug)]
pub struct RawFsInfoRecord {
    pub disk_index: u16,
    pub info: *mut FsInfo,
}

/// FS_GET_ENTRY
#[repr(C)]
#[derive(Debug)]
pub struct RawFsEntryRecord {
    pub path: *const u8,
    pub parent: u16,
    pub disk: u16,
    pub entry: *mut FsEntry,
}

/// FS_READ_FILE, FS_WRITE_FILE
#[repr(C)]
#[derive(Debug)]
pub struct RawFsRwRecord {
    pub buffer: *mut u8,
    pub path: *const u8,
    pub offset: u16,
    pub count: u16,
    pub flags: u16,
}

/// FS_MOVE, FS_COPY
#[repr(C)]
#[derive(Debug)]
pub struct RawFsSrcDst {
    pub src: *const u8,
    pub dst: *const u8,
}

/// FS_LIST
#[repr(C)]
#[derive(Debug)]
pub struct RawFsListRecord {
    pub path: *const u8,
    pub index: u16,
    pub entry: *mut FsEntry,
}

unsafe fn scalar_u16(param: *mut u8) -> u16 {
    if param.is_null() {
        0
    } else {
        ptr::read_unaligned(param as *const u16)
    }
}

unsafe fn scalar_u8(param: *mut u8) -> u8 {
    if param.is_null() {
        0
    } else {
        *param
    }
}

/// Why a raw request could not be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    /// Null record or null pointer inside a record
    Null,
    /// Path bytes that are not valid UTF-8
    BadPath,
}

unsafe fn record<'a, T>(param: *mut u8) -> Result<&'a mut T, Fault> {
    (param as *mut T).as_mut().ok_or(Fault::Null)
}

unsafe fn out<'a, T>(ptr: *mut T) -> Result<&'a mut T, Fault> {
    ptr.as_mut().ok_or(Fault::Null)
}

unsafe fn c_path<'a>(path: *const u8) -> Result<&'a str, Fault> {
    if path.is_null() {
        return Err(Fault::Null);
    }
    CStr::from_ptr(path as *const c_char).to_str().map_err(|_| Fault::BadPath)
}

unsafe fn decode<'a>(opcode: u16, param: *mut u8) -> Result<Request<'a>, Fault> {
    let Ok(op) = Opcode::try_from(opcode) else {
        return Ok(Request::Unsupported(opcode));
    };

    let request = match op {
        Opcode::GetScreenSize => {
            let ps = record::<RawPosition>(param)?;
            Request::GetScreenSize { width: out(ps.px)?, height: out(ps.py)? }
        }
        Opcode::ClearScreen => Request::ClearScreen,
        Opcode::OutChar => Request::OutChar(scalar_u8(param)),
        Opcode::OutCharAttr => Request::OutCharAttr(*record::<CharAttr>(param)?),
        Opcode::SetCursorPos => {
            let ps = record::<RawPosition>(param)?;
            Request::SetCursorPos(Position { x: ps.x, y: ps.y })
        }
        Opcode::GetCursorPos => {
            let ps = record::<RawPosition>(param)?;
            Request::GetCursorPos { x: out(ps.px)?, y: out(ps.py)? }
        }
        Opcode::SetShowCursor => Request::SetShowCursor(CursorMode::from_raw(scalar_u16(param))),
        Opcode::InKey => Request::InKey(KeyMode::from_raw(scalar_u16(param))),
        Opcode::OutCharSerial => Request::OutCharSerial(scalar_u8(param)),
        Opcode::InCharSerial => Request::InCharSerial,
        Opcode::OutCharDebug => Request::OutCharDebug(scalar_u8(param)),

        Opcode::FsGetInfo => {
            let fi = record::<RawFsInfoRecord>(param)?;
            Request::FsGetInfo { disk_index: fi.disk_index, info: out(fi.info)? }
        }
        Opcode::FsGetEntry => {
            let fe = record::<RawFsEntryRecord>(param)?;
            Request::FsGetEntry {
                path: c_path(fe.path)?,
                parent: fe.parent,
                disk: fe.disk,
                entry: out(fe.entry)?,
            }
        }
        Opcode::FsReadFile => {
            let rw = record::<RawFsRwRecord>(param)?;
            let buffer: &mut [u8] = if rw.count == 0 {
                &mut []
            } else if rw.buffer.is_null() {
                return Err(Fault::Null);
            } else {
                core::slice::from_raw_parts_mut(rw.buffer, rw.count as usize)
            };
            Request::FsReadFile { path: c_path(rw.path)?, offset: rw.offset, buffer }
        }
        Opcode::FsWriteFile => {
            let rw = record::<RawFsRwRecord>(param)?;
            let buffer: &[u8] = if rw.count == 0 {
                &[]
            } else if rw.buffer.is_null() {
                return Err(Fault::Null);
            } else {
                core::slice::from_raw_parts(rw.buffer, rw.count as usize)
            };
            Request::FsWriteFile { path: c_path(rw.path)?, offset: rw.offset, buffer, flags: rw.flags }
        }
        Opcode::FsMove => {
            let sd = record::<RawFsSrcDst>(param)?;
            Request::FsMove { src: c_path(sd.src)?, dst: c_path(sd.dst)? }
        }
        Opcode::FsCopy => {
            let sd = record::<RawFsSrcDst>(param)?;
            Request::FsCopy { src: c_path(sd.src)?, dst: c_path(sd.dst)? }
        }
        Opcode::FsDelete => Request::FsDelete { path: c_path(param)? },
        Opcode::FsCreateDirectory => Request::FsCreateDirectory { path: c_path(param)? },
        Opcode::FsList => {
            let fl = record::<RawFsListRecord>(param)?;
            Request::FsList { path: c_path(fl.path)?, index: fl.index, entry: out(fl.entry)? }
        }
        Opcode::FsFormat => Request::FsFormat { disk: scalar_u16(param) },

        Opcode::MemAllocate => Request::MemAllocate { size: scalar_u16(param) },
        // The pointer value is the address
        Opcode::MemFree => Request::MemFree { address: param as usize as u16 },
        Opcode::FarAllocate => Request::FarAllocate(record::<FarMemRecord>(param)?),
        Opcode::FarFree => Request::FarFree { address: record::<FarMemRecord>(param)?.address },
        Opcode::FarGetByte => Request::FarGetByte { address: record::<FarMemRecord>(param)?.address },
        Opcode::FarSetByte => {
            let lm = record::<FarMemRecord>(param)?;
            Request::FarSetByte { address: lm.address, value: lm.n as u8 }
        }

        Opcode::ClkGetTime => Request::ClkGetTime(record::<Time>(param)?),
    };

    Ok(request)
}

impl<'a> Request<'a> {
    /// Decode a raw `(opcode, param)` pair
    ///
    /// # Safety
    /// `param` must be null or point to the record the opcode expects, and
    /// every pointer inside that record must be null or valid for `'a`.
    /// Path pointers must reference NUL terminated strings.
    pub unsafe fn from_raw(opcode: u16, param: *mut u8) -> Request<'a> {
        match decode(opcode, param) {
            Ok(request) => request,
            Err(Fault::Null) => Request::Unsupported(opcode),
            Err(Fault::BadPath) => Request::Malformed(opcode),
        }
    }
}

/// Raw kernel entry point
pub type RawEntry = unsafe extern "C" fn(service: u16, param: *mut u8) -> u16;

/// NUL terminated copy of a path, truncated to the buffer
struct CPath {
    buf: [u8; PATH_BUFFER_SIZE],
}

impl CPath {
    fn new(path: &str) -> Self {
        let mut buf = [0u8; PATH_BUFFER_SIZE];
        copy_bounded(&mut buf, path.as_bytes());
        CPath { buf }
    }

    fn as_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.buf.as_mut_ptr()
    }
}

/// Program side of the raw ABI
///
/// Encodes each [`Request`] into its raw record and calls the kernel entry.
pub struct RawGate {
    entry: RawEntry,
}

impl RawGate {
    /// # Safety
    /// `entry` must decode its parameters exactly as [`Request::from_raw`]
    /// does.
    pub const unsafe fn new(entry: RawEntry) -> Self {
        RawGate { entry }
    }

    fn call<T>(&self, opcode: u16, param: *mut T) -> u16 {
        // Every record passed here lives on the caller's stack for the call
        unsafe { (self.entry)(opcode, param as *mut u8) }
    }
}

impl Service for RawGate {
    fn service(&mut self, request: Request<'_>) -> u16 {
        let op = request.opcode();
        match request {
            Request::GetScreenSize { width, height } => {
                let mut ps = RawPosition { x: 0, y: 0, px: width, py: height };
                self.call(op, &mut ps)
            }
            Request::ClearScreen | Request::InCharSerial | Request::Unsupported(_) | Request::Malformed(_) => {
                self.call(op, ptr::null_mut::<u8>())
            }
            Request::OutChar(c) | Request::OutCharSerial(c) | Request::OutCharDebug(c) => {
                let mut c = c;
                self.call(op, &mut c)
            }
            Request::OutCharAttr(ca) => {
                let mut ca = ca;
                self.call(op, &mut ca)
            }
            Request::SetCursorPos(pos) => {
                let mut ps = RawPosition { x: pos.x, y: pos.y, px: ptr::null_mut(), py: ptr::null_mut() };
                self.call(op, &mut ps)
            }
            Request::GetCursorPos { x, y } => {
                let mut ps = RawPosition { x: 0, y: 0, px: x, py: y };
                self.call(op, &mut ps)
            }
            Request::SetShowCursor(mode) => {
                let mut mode = mode.to_raw();
                self.call(op, &mut mode)
            }
            Request::InKey(mode) => {
                let mut mode = mode.to_raw();
                self.call(op, &mut mode)
            }

            Request::FsGetInfo { disk_index, info } => {
                let mut fi = RawFsInfoRecord { disk_index, info };
                self.call(op, &mut fi)
            }
            Request::FsGetEntry { path, parent, disk, entry } => {
                let path = CPath::new(path);
                let mut fe = RawFsEntryRecord { path: path.as_ptr(), parent, disk, entry };
                self.call(op, &mut fe)
            }
            Request::FsReadFile { path, offset, buffer } => {
                let path = CPath::new(path);
                let mut rw = RawFsRwRecord {
                    buffer: buffer.as_mut_ptr(),
                    path: path.as_ptr(),
                    offset,
                    count: buffer.len().min(u16::MAX as usize) as u16,
                    flags: 0,
                };
                self.call(op, &mut rw)
            }
            Request::FsWriteFile { path, offset, buffer, flags } => {
                let path = CPath::new(path);
                let mut rw = RawFsRwRecord {
                    buffer: buffer.as_ptr() as *mut u8,
                    path: path.as_ptr(),
                    offset,
                    count: buffer.len().min(u16::MAX as usize) as u16,
                    flags,
                };
                self.call(op, &mut rw)
            }
            Request::FsMove { src, dst } | Request::FsCopy { src, dst } => {
                let (src, dst) = (CPath::new(src), CPath::new(dst));
                let mut sd = RawFsSrcDst { src: src.as_ptr(), dst: dst.as_ptr() };
                self.call(op, &mut sd)
            }
            Request::FsDelete { path } | Request::FsCreateDirectory { path } => {
                let mut path = CPath::new(path);
                self.call(op, path.as_mut_ptr())
            }
            Request::FsList { path, index, entry } => {
                let path = CPath::new(path);
                let mut fl = RawFsListRecord { path: path.as_ptr(), index, entry };
                self.call(op, &mut fl)
            }
            Request::FsFormat { disk } => {
                let mut disk = disk;
                self.call(op, &mut disk)
            }

            Request::MemAllocate { size } => {
                let mut size = size;
                self.call(op, &mut size)
            }
            Request::MemFree { address } => self.call(op, address as usize as *mut u8),
            Request::FarAllocate(lm) => self.call(op, lm),
            Request::FarFree { address } | Request::FarGetByte { address } => {
                let mut lm = FarMemRecord { address, n: 0 };
                self.call(op, &mut lm)
            }
            Request::FarSetByte { address, value } => {
                let mut lm = FarMemRecord { address, n: value as u32 };
                self.call(op, &mut lm)
            }

            Request::ClkGetTime(time) => self.call(op, time),
        }
    }
}
