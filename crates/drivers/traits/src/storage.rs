//! Storage Trait
//!
//! Implemented by the filesystem engine. Every operation answers with the
//! same success value the service ABI returns (an entry id, a byte count,
//! an entry count) or an [`FsError`](nanos_syscall::FsError).

use nanos_syscall::{FsEntry, FsInfo, FsResult};

/// Filesystem engine
pub trait Storage {
    /// Fill `info` for disk `disk_index`
    fn info(&mut self, disk_index: u16, info: &mut FsInfo) -> FsResult<u16>;

    /// Resolve `path`
    ///
    /// `parent` and `disk` may be `UNKNOWN_VALUE`, in which case they are
    /// derived from the path.
    fn get_entry(&mut self, path: &str, parent: u16, disk: u16, entry: &mut FsEntry) -> FsResult<u16>;

    /// Read into `buffer` from `offset`, returns bytes read
    fn read_file(&mut self, path: &str, offset: u16, buffer: &mut [u8]) -> FsResult<u16>;

    /// Write `buffer` at `offset`, returns bytes written
    fn write_file(&mut self, path: &str, offset: u16, buffer: &[u8], flags: u16) -> FsResult<u16>;

    fn move_entry(&mut self, src: &str, dst: &str) -> FsResult<u16>;

    fn copy_entry(&mut self, src: &str, dst: &str) -> FsResult<u16>;

    fn delete(&mut self, path: &str) -> FsResult<u16>;

    fn create_directory(&mut self, path: &str) -> FsResult<u16>;

    /// Fetch entry `index` of directory `path`, returns the entry count
    fn list(&mut self, path: &str, index: u16, entry: &mut FsEntry) -> FsResult<u16>;

    fn format(&mut self, disk: u16) -> FsResult<u16>;
}
