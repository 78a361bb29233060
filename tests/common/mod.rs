//! Mock platform shared by the integration tests
//!
//! A screen that records every character, a scripted keyboard, a serial
//! port, a settable RTC, a sparse far memory and a small in-memory
//! filesystem behind the `Storage` trait.
//!
//! Every disk other than the system disk shows up as a directory named
//! after it ("hd1/..."), hidden from the root listing.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};

use nanos16::drivers::{BcdDateTime, Display, FarMemory, Keyboard, Rtc, SerialPort, Storage};
use nanos16::syscall::numbers::{T_DIR, T_FILE, WRITE_FLAG_APPEND};
use nanos16::syscall::{FsEntry, FsError, FsInfo, FsResult, Time};
use nanos16::{Kernel, KernelConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockPlatform {
    /// Every character written through `out_char`
    pub screen: Vec<u8>,
    /// `(x, y, c, attr)` for every `out_char_attr`
    pub cells: Vec<(u16, u16, u8, u8)>,
    pub cursor: (u16, u16),
    pub cursor_visible: bool,
    pub clears: usize,

    /// Pending key codes; an empty queue polls as 0
    pub keys: VecDeque<u16>,
    pub polls: usize,

    pub serial_out: Vec<u8>,
    pub serial_in: VecDeque<u8>,
    pub serial_status: u8,

    pub rtc: BcdDateTime,

    pub far: BTreeMap<u32, u8>,

    /// Paths without the leading `/`; the root directory is ""
    pub nodes: BTreeMap<String, Node>,
    /// Packed modification times; missing entries read as 0
    pub times: BTreeMap<String, u32>,
    pub disks: Vec<FsInfo>,
    /// Number of `read_file` calls
    pub reads: usize,
    pub formats: Vec<u16>,
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn parent_of(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

fn base_name(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

fn bios_id(name: &str) -> u16 {
    match name {
        "fd0" => 0x00,
        "fd1" => 0x01,
        "hd0" => 0x80,
        "hd1" => 0x81,
        _ => 0xFF,
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(String::new(), Node::Dir);
        MockPlatform { nodes, ..Default::default() }
    }

    pub fn with_file(mut self, path: &str, data: &[u8]) -> Self {
        self.nodes.insert(normalize(path), Node::File(data.to_vec()));
        self
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        self.nodes.insert(normalize(path), Node::Dir);
        self
    }

    /// Add a disk; its BIOS id follows from the name (fd0 0x00, hd1 0x81...)
    pub fn with_disk(mut self, name: &str, fs_type: u16, fs_size: u32, disk_size: u32) -> Self {
        let mut info = FsInfo { id: bios_id(name), fs_type, fs_size, disk_size, ..Default::default() };
        info.set_name(name);
        self.disks.push(info);
        self.nodes.insert(name.to_string(), Node::Dir);
        self
    }

    pub fn with_time(mut self, path: &str, time: Time) -> Self {
        self.times.insert(normalize(path), time.to_fs_time());
        self
    }

    pub fn type_keys(&mut self, s: &str) {
        self.keys.extend(s.bytes().map(u16::from));
    }

    pub fn screen_text(&self) -> String {
        String::from_utf8_lossy(&self.screen).into_owned()
    }

    pub fn file(&self, path: &str) -> Option<&[u8]> {
        match self.nodes.get(&normalize(path)) {
            Some(Node::File(data)) => Some(data),
            _ => None,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(&normalize(path))
    }

    fn is_disk_root(&self, path: &str) -> bool {
        self.disks.iter().any(|d| d.name() == path)
    }

    /// Direct children of directory `dir`, in name order
    fn children(&self, dir: &str) -> Vec<String> {
        self.nodes
            .keys()
            .filter(|k| !k.is_empty() && parent_of(k) == dir && !self.is_disk_root(k))
            .cloned()
            .collect()
    }

    /// `path` and everything below it
    fn subtree(&self, path: &str) -> Vec<String> {
        let prefix = format!("{}/", path);
        self.nodes
            .keys()
            .filter(|k| k.as_str() == path || k.starts_with(&prefix))
            .cloned()
            .collect()
    }

    fn fill_entry(&self, path: &str, entry: &mut FsEntry) {
        *entry = match &self.nodes[path] {
            Node::Dir => FsEntry::new(base_name(path), T_DIR, self.children(path).len() as u16),
            Node::File(data) => FsEntry::new(base_name(path), T_FILE, data.len() as u16),
        };
        entry.time = self.times.get(path).copied().unwrap_or(0);
    }

    fn check_destination(&self, dst: &str) -> FsResult<()> {
        if self.nodes.contains_key(dst) {
            return Err(FsError::Exists);
        }
        match self.nodes.get(parent_of(dst)) {
            Some(Node::Dir) => Ok(()),
            _ => Err(FsError::NotFound),
        }
    }
}

impl Display for MockPlatform {
    fn clear_screen(&mut self) {
        self.clears += 1;
        self.cursor = (0, 0);
    }

    fn out_char(&mut self, c: u8) {
        self.screen.push(c);
    }

    fn out_char_attr(&mut self, x: u16, y: u16, c: u8, attr: u8) {
        self.cells.push((x, y, c, attr));
    }

    fn set_cursor_pos(&mut self, x: u16, y: u16) {
        self.cursor = (x, y);
    }

    fn cursor_pos(&self) -> (u16, u16) {
        self.cursor
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }
}

impl Keyboard for MockPlatform {
    fn poll_key(&mut self) -> u16 {
        self.polls += 1;
        self.keys.pop_front().unwrap_or(0)
    }
}

impl SerialPort for MockPlatform {
    fn serial_write(&mut self, c: u8) {
        self.serial_out.push(c);
    }

    fn serial_read(&mut self) -> u8 {
        self.serial_in.pop_front().unwrap_or(0)
    }

    fn line_status(&self) -> u8 {
        self.serial_status
    }
}

impl Rtc for MockPlatform {
    fn read_rtc(&mut self) -> BcdDateTime {
        self.rtc
    }
}

impl FarMemory for MockPlatform {
    fn far_read(&self, address: u32) -> u8 {
        self.far.get(&address).copied().unwrap_or(0)
    }

    fn far_write(&mut self, address: u32, value: u8) {
        self.far.insert(address, value);
    }
}

impl Storage for MockPlatform {
    fn info(&mut self, disk_index: u16, info: &mut FsInfo) -> FsResult<u16> {
        match self.disks.get(disk_index as usize) {
            Some(disk) => {
                *info = *disk;
                Ok(0)
            }
            None => Err(FsError::NotFound),
        }
    }

    fn get_entry(&mut self, path: &str, _parent: u16, _disk: u16, entry: &mut FsEntry) -> FsResult<u16> {
        let path = normalize(path);
        let id = self.nodes.keys().position(|k| *k == path).ok_or(FsError::NotFound)?;
        self.fill_entry(&path, entry);
        Ok(id as u16)
    }

    fn read_file(&mut self, path: &str, offset: u16, buffer: &mut [u8]) -> FsResult<u16> {
        self.reads += 1;
        let Some(Node::File(data)) = self.nodes.get(&normalize(path)) else {
            return Err(FsError::NotFound);
        };
        let start = (offset as usize).min(data.len());
        let n = buffer.len().min(data.len() - start);
        buffer[..n].copy_from_slice(&data[start..start + n]);
        Ok(n as u16)
    }

    fn write_file(&mut self, path: &str, offset: u16, buffer: &[u8], flags: u16) -> FsResult<u16> {
        let path = normalize(path);
        if !self.nodes.contains_key(&path) {
            self.check_destination(&path)?;
            self.nodes.insert(path.clone(), Node::File(Vec::new()));
        }
        let Some(Node::File(data)) = self.nodes.get_mut(&path) else {
            return Err(FsError::Invalid);
        };
        let start = if flags == WRITE_FLAG_APPEND { data.len() } else { offset as usize };
        if data.len() < start + buffer.len() {
            data.resize(start + buffer.len(), 0);
        }
        data[start..start + buffer.len()].copy_from_slice(buffer);
        Ok(buffer.len() as u16)
    }

    fn move_entry(&mut self, src: &str, dst: &str) -> FsResult<u16> {
        let (src, dst) = (normalize(src), normalize(dst));
        if !self.nodes.contains_key(&src) {
            return Err(FsError::NotFound);
        }
        self.check_destination(&dst)?;
        for key in self.subtree(&src) {
            let moved = format!("{}{}", dst, &key[src.len()..]);
            if let Some(time) = self.times.remove(&key) {
                self.times.insert(moved.clone(), time);
            }
            if let Some(node) = self.nodes.remove(&key) {
                self.nodes.insert(moved, node);
            }
        }
        Ok(0)
    }

    fn copy_entry(&mut self, src: &str, dst: &str) -> FsResult<u16> {
        let (src, dst) = (normalize(src), normalize(dst));
        if !self.nodes.contains_key(&src) {
            return Err(FsError::NotFound);
        }
        self.check_destination(&dst)?;
        for key in self.subtree(&src) {
            let node = self.nodes[&key].clone();
            self.nodes.insert(format!("{}{}", dst, &key[src.len()..]), node);
        }
        Ok(0)
    }

    fn delete(&mut self, path: &str) -> FsResult<u16> {
        let path = normalize(path);
        if path.is_empty() || !self.nodes.contains_key(&path) {
            return Err(FsError::NotFound);
        }
        for key in self.subtree(&path) {
            self.nodes.remove(&key);
        }
        Ok(0)
    }

    fn create_directory(&mut self, path: &str) -> FsResult<u16> {
        let path = normalize(path);
        self.check_destination(&path)?;
        self.nodes.insert(path, Node::Dir);
        Ok(0)
    }

    fn list(&mut self, path: &str, index: u16, entry: &mut FsEntry) -> FsResult<u16> {
        let path = normalize(path);
        match self.nodes.get(&path) {
            Some(Node::Dir) => {}
            _ => return Err(FsError::NotFound),
        }
        let children = self.children(&path);
        if let Some(child) = children.get(index as usize) {
            self.fill_entry(child, entry);
        }
        Ok(children.len() as u16)
    }

    /// Wipe the disk whose BIOS id is `disk`
    fn format(&mut self, disk: u16) -> FsResult<u16> {
        let name = match self.disks.iter().find(|d| d.id == disk) {
            Some(info) => info.name().to_string(),
            None => return Err(FsError::Invalid),
        };
        self.formats.push(disk);
        for key in self.subtree(&name) {
            self.nodes.remove(&key);
            self.times.remove(&key);
        }
        self.nodes.insert(name, Node::Dir);
        Ok(0)
    }
}

/// Kernel over `platform` with serial debug off
pub fn kernel(platform: MockPlatform) -> Kernel<MockPlatform> {
    Kernel::new(platform, KernelConfig { serial_debug: false, ..Default::default() })
}

