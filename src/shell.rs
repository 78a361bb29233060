//! Integrated command shell
//!
//! Reads a line, splits it on spaces and runs a built-in command; anything
//! else is handed to the program loader. The shell is an ordinary client
//! of the service interface: every action it takes is a [`Service`]
//! request.

use core::fmt::{self, Write};

use nanos_process::{EntryPoint, ProgramLoader};
use nanos_syscall::io::{read_line, Screen};
use nanos_syscall::numbers::FS_TYPE_NSFS;
use nanos_syscall::raw::PATH_BUFFER_SIZE;
use nanos_syscall::syscalls::{
    clear_screen, copy_entry, create_directory, delete, format, get_fsinfo, getkey, list, move_entry, putchar,
    read_file, time,
};
use nanos_syscall::{FsEntry, FsError, FsInfo, KeyMode, Service, Time};

use crate::kernel::KernelControl;

/// Input line capacity, terminator included
pub const LINE_CAPACITY: usize = 72;

/// Words past this many are dropped
pub const MAX_ARGS: usize = 4;

/// Listed when `list` has no argument
pub const ROOT_DIR_NAME: &str = "/";

/// Disks probed by `info` and `clone`
pub const MAX_DISK: u16 = 4;

const READ_CHUNK: usize = 128;

/// Filesystem blocks of 512 bytes per MB
const BLOCKS_PER_MB: u32 = 2048;

/// Column right after the last digit of a `list` size
const LIST_SIZE_COLUMN: usize = 23;

/// Tokenized command line
#[derive(Debug, Clone, Copy)]
pub struct Args<'l> {
    argv: [&'l str; MAX_ARGS],
    argc: usize,
}

impl<'l> Args<'l> {
    pub fn parse(line: &'l str) -> Self {
        let mut argv = [""; MAX_ARGS];
        let mut argc = 0;
        for word in line.split(' ').filter(|w| !w.is_empty()).take(MAX_ARGS) {
            argv[argc] = word;
            argc += 1;
        }
        Args { argv, argc }
    }

    pub fn as_slice(&self) -> &[&'l str] {
        &self.argv[..self.argc]
    }

    pub fn len(&self) -> usize {
        self.argc
    }

    pub fn is_empty(&self) -> bool {
        self.argc == 0
    }
}

fn print<S: Service + ?Sized>(sys: &mut S, args: fmt::Arguments<'_>) {
    // Screen output cannot fail
    let _ = Screen(sys).write_fmt(args);
}

/// `YYYY/MM/DD hh:mm:ss`
struct Date(Time);

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.0;
        write!(f, "{}/{:02}/{:02} {:02}:{:02}:{:02}", t.year, t.month, t.day, t.hour, t.minute, t.second)
    }
}

/// Path assembled on the stack; writes that do not fit fail whole
struct PathBuf {
    buf: [u8; PATH_BUFFER_SIZE],
    len: usize,
}

impl PathBuf {
    fn new() -> Self {
        PathBuf { buf: [0; PATH_BUFFER_SIZE], len: 0 }
    }

    fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl Write for PathBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Room is kept for the terminator the raw ABI adds
        let end = self.len + s.len();
        if end >= PATH_BUFFER_SIZE {
            return Err(fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

/// Shell state: the program slot and how to start what lands in it
pub struct Shell<'s, E: EntryPoint> {
    loader: ProgramLoader<'s>,
    entry: E,
}

impl<'s, E: EntryPoint> Shell<'s, E> {
    pub fn new(loader: ProgramLoader<'s>, entry: E) -> Self {
        Shell { loader, entry }
    }

    /// Prompt forever
    pub fn run<S: Service + KernelControl>(&mut self, sys: &mut S) -> ! {
        loop {
            self.prompt(sys);
        }
    }

    /// Show the prompt, read one line and run it
    pub fn prompt<S: Service + KernelControl>(&mut self, sys: &mut S) {
        print(sys, format_args!("> "));
        let mut buf = [0u8; LINE_CAPACITY];
        let line = read_line(sys, &mut buf);
        log::debug!("> {}", line);
        self.execute(sys, line);
    }

    /// Run one command line
    pub fn execute<S: Service + KernelControl>(&mut self, sys: &mut S, line: &str) {
        let args = Args::parse(line);
        let argv = args.as_slice();
        let Some(&command) = argv.first() else {
            return;
        };

        match command {
            "cls" => cls(sys, argv),
            "list" => list_dir(sys, argv),
            "makedir" => makedir(sys, argv),
            "delete" => delete_entry(sys, argv),
            "move" => move_or_copy(sys, argv, false),
            "copy" => move_or_copy(sys, argv, true),
            "info" => info(sys, argv),
            "clone" => clone_disk(sys, argv),
            "read" => read(sys, argv),
            "time" => show_time(sys, argv),
            "config" => config(sys, argv),
            "help" => help(sys, argv),
            _ => {
                if let Err(err) = self.loader.exec(&mut *sys, &mut self.entry, argv) {
                    print(sys, format_args!("{}\n\r", err));
                }
            }
        }
    }
}

/// First disk among the `MAX_DISK` slots matching `pred`
fn find_disk<S: Service + ?Sized>(sys: &mut S, pred: impl Fn(&FsInfo) -> bool) -> Option<FsInfo> {
    (0..MAX_DISK).filter_map(|disk| get_fsinfo(sys, disk).ok()).find(|d| pred(d))
}

/// Print the message for a failed storage request
fn report_fs_error<S: Service + ?Sized>(sys: &mut S, err: FsError, otherwise: &str) {
    let message = match err {
        FsError::NotFound => "error: path not found",
        FsError::Exists => "error: destination already exists",
        FsError::NoSpace => "error: can't allocate destination in filesystem",
        _ => otherwise,
    };
    print(sys, format_args!("{}\n\r", message));
}

fn digits(mut n: u16) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

fn cls<S: Service + ?Sized>(sys: &mut S, argv: &[&str]) {
    if argv.len() == 1 {
        clear_screen(sys);
    } else {
        print(sys, format_args!("usage: cls\n\r"));
    }
}

fn list_dir<S: Service + ?Sized>(sys: &mut S, argv: &[&str]) {
    let path = match argv.len() {
        1 => ROOT_DIR_NAME,
        2 => argv[1],
        _ => {
            print(sys, format_args!("usage: list <path>\n\r"));
            return;
        }
    };

    let mut entry = FsEntry::default();
    let count = match list(sys, path, 0, &mut entry) {
        Ok(n) => n,
        Err(_) => {
            print(sys, format_args!("path not found\n\r"));
            return;
        }
    };
    if count == 0 {
        return;
    }

    print(sys, format_args!("\n\r"));
    for i in 0..count {
        if list(sys, path, i, &mut entry).is_err() {
            print(sys, format_args!("Error\n\r"));
            break;
        }

        let (prefix, unit) = if entry.is_dir() { ("+ ", "items") } else { ("  ", "bytes") };
        let pad = LIST_SIZE_COLUMN.saturating_sub(prefix.len() + entry.name().len() + digits(entry.size));
        print(
            sys,
            format_args!(
                "{}{}{:pad$}{} {}   {}\n\r",
                prefix,
                entry.name(),
                "",
                entry.size,
                unit,
                Date(entry.modified()),
                pad = pad
            ),
        );
    }
    print(sys, format_args!("\n\r"));
}

fn makedir<S: Service + ?Sized>(sys: &mut S, argv: &[&str]) {
    if argv.len() != 2 {
        print(sys, format_args!("usage: makedir <path>\n\r"));
        return;
    }
    if let Err(err) = create_directory(sys, argv[1]) {
        report_fs_error(sys, err, "error: couldn't create directory");
    }
}

fn delete_entry<S: Service + ?Sized>(sys: &mut S, argv: &[&str]) {
    if argv.len() != 2 {
        print(sys, format_args!("usage: delete <path>\n\r"));
        return;
    }
    if delete(sys, argv[1]).is_err() {
        print(sys, format_args!("error: failed to delete\n\r"));
    }
}

fn move_or_copy<S: Service + ?Sized>(sys: &mut S, argv: &[&str], copy: bool) {
    if argv.len() != 3 {
        let usage = if copy {
            "usage: copy <srcpath> <dstpath>"
        } else {
            "usage: move <path> <newpath>"
        };
        print(sys, format_args!("{}\n\r", usage));
        return;
    }

    let result = if copy {
        copy_entry(sys, argv[1], argv[2])
    } else {
        move_entry(sys, argv[1], argv[2])
    };
    if let Err(err) = result {
        let otherwise = if copy { "error: couldn't copy files" } else { "error: couldn't move files" };
        report_fs_error(sys, err, otherwise);
    }
}

fn info<S: Service + KernelControl + ?Sized>(sys: &mut S, argv: &[&str]) {
    if argv.len() != 1 {
        print(sys, format_args!("usage: info\n\r"));
        return;
    }

    print(sys, format_args!("\n\rNANOS16 [Version {}]\n\r\n\r", env!("CARGO_PKG_VERSION")));
    print(sys, format_args!("Disks:\n\r"));
    for disk in 0..MAX_DISK {
        let Ok(disk_info) = get_fsinfo(sys, disk) else {
            continue;
        };
        if disk_info.disk_size == 0 {
            continue;
        }
        let fs = if disk_info.fs_type == FS_TYPE_NSFS { "NSFS" } else { "UNKN" };
        print(
            sys,
            format_args!(
                "{} {}({}MB)   Disk size: {}MB\n\r",
                disk_info.name(),
                fs,
                disk_info.fs_size / BLOCKS_PER_MB,
                disk_info.disk_size
            ),
        );
    }
    print(sys, format_args!("\n\r"));

    let system_id = sys.system_disk();
    match find_disk(sys, |d| d.id == system_id) {
        Some(system) => print(sys, format_args!("System disk: {}\n\r", system.name())),
        None => print(sys, format_args!("System disk: {:#04x}\n\r", system_id)),
    }
    let serial = if sys.serial_status() & 0x80 != 0 { "Error" } else { "Enabled" };
    print(sys, format_args!("Serial port status: {}\n\r\n\r", serial));
}

fn print_disk<S: Service + ?Sized>(sys: &mut S, role: &str, disk: &FsInfo) {
    let fs = if disk.fs_type == FS_TYPE_NSFS { "NSFS   " } else { "unknown" };
    print(
        sys,
        format_args!("{} disk: {}    fs={}  size={}MB\n\r", role, disk.name(), fs, disk.fs_size / BLOCKS_PER_MB),
    );
}

/// Format `argv[1]` and copy every root entry of the system disk onto it
fn clone_disk<S: Service + KernelControl + ?Sized>(sys: &mut S, argv: &[&str]) {
    if argv.len() != 2 {
        print(sys, format_args!("usage: clone <target_disk>\n\r"));
        return;
    }
    let target_name = argv[1];

    let system_id = sys.system_disk();
    let Some(system) = find_disk(sys, |d| d.id == system_id) else {
        print(sys, format_args!("System disk not found ({:#04x})\n\r", system_id));
        return;
    };
    print_disk(sys, "System", &system);

    let Some(target) = find_disk(sys, |d| d.name() == target_name) else {
        print(sys, format_args!("Target disk not found ({})\n\r", target_name));
        return;
    };
    if target.id == system.id {
        print(sys, format_args!("Target disk can't be the system disk\n\r"));
        return;
    }
    print_disk(sys, "Target", &target);

    print(
        sys,
        format_args!(
            "\n\rTarget disk ({0}) will lose all data\n\r\
             Target disk ({0}) will contain a {1}MB NSFS filesystem after operation\n\r\n\r\
             Press 'y' to confirm: ",
            target.name(),
            target.disk_size
        ),
    );
    if getkey(sys, KeyMode::Wait) & 0xFF != u16::from(b'y') {
        print(sys, format_args!("\n\rUser aborted operation\n\r"));
        return;
    }
    print(sys, format_args!("y\n\r"));

    print(sys, format_args!("Formatting and copying system files...\n\r"));
    if let Err(err) = format(sys, target.id) {
        log::debug!("format {}: {}", target.name(), err);
        print(sys, format_args!("Error formatting disk. Aborted\n\r"));
        return;
    }

    print(sys, format_args!("Copying user files...\n\r"));
    let mut entry = FsEntry::default();
    let Ok(count) = list(sys, ROOT_DIR_NAME, 0, &mut entry) else {
        print(sys, format_args!("Error creating file list\n\r"));
        return;
    };

    for i in 0..count {
        if list(sys, ROOT_DIR_NAME, i, &mut entry).is_err() {
            print(sys, format_args!("Error copying files. Aborted\n\r"));
            return;
        }

        let mut dst = PathBuf::new();
        let copied = match write!(dst, "{}/{}", target.name(), entry.name()) {
            Ok(()) => {
                log::debug!("copy {} {}", entry.name(), dst.as_str());
                copy_entry(sys, entry.name(), dst.as_str())
            }
            Err(_) => Err(FsError::Invalid),
        };
        // Files the format already placed on the target are expected
        match copied {
            Ok(_) | Err(FsError::Exists) => {}
            Err(_) => {
                print(sys, format_args!("Error copying {}. Aborted\n\r", entry.name()));
                return;
            }
        }
    }
    print(sys, format_args!("Operation completed\n\r"));
}

fn read<S: Service + ?Sized>(sys: &mut S, argv: &[&str]) {
    if argv.len() != 2 {
        print(sys, format_args!("usage: read <path>\n\r"));
        return;
    }

    let mut buf = [0u8; READ_CHUNK];
    let mut offset: u16 = 0;
    loop {
        let n = match read_file(sys, argv[1], offset, &mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => {
                print(sys, format_args!("\n\rThere was an error reading input file\n\r"));
                break;
            }
        };

        for &b in &buf[..(n as usize).min(READ_CHUNK)] {
            putchar(sys, b);
            if b == b'\n' {
                putchar(sys, b'\r');
            }
        }

        match offset.checked_add(n) {
            Some(next) => offset = next,
            None => break,
        }
    }
    print(sys, format_args!("\n\r"));
}

fn show_time<S: Service + ?Sized>(sys: &mut S, argv: &[&str]) {
    if argv.len() != 1 {
        print(sys, format_args!("usage: time\n\r"));
        return;
    }

    let now = time(sys);
    print(sys, format_args!("\n\r{}\n\r\n\r", Date(now)));
}

fn config<S: Service + KernelControl + ?Sized>(sys: &mut S, argv: &[&str]) {
    match argv {
        [_] => {
            let state = if sys.serial_debug() { " enabled" } else { "disabled" };
            print(
                sys,
                format_args!("\n\rdebug: {}       - output debug info through serial port\n\r\n\r", state),
            );
        }
        [_, "debug", value] => match *value {
            "enabled" => sys.set_serial_debug(true),
            "disabled" => sys.set_serial_debug(false),
            _ => print(sys, format_args!("Invalid value. Valid values are: enabled, disabled\n\r")),
        },
        _ => print(sys, format_args!("usages:\n\rconfig\n\rconfig <debug> <enabled|disabled>\n\r")),
    }
}

fn help<S: Service + ?Sized>(sys: &mut S, argv: &[&str]) {
    if argv.len() != 1 {
        print(sys, format_args!("usage: help\n\r"));
        return;
    }

    print(
        sys,
        format_args!(
            "\n\rBuilt-in commands:\n\r\n\r\
             clone    - clone system in another disk\n\r\
             cls      - clear the screen\n\r\
             config   - show or set config\n\r\
             copy     - create a copy of a file or directory\n\r\
             delete   - delete entry\n\r\
             help     - show this help\n\r\
             info     - show system info\n\r\
             list     - list directory contents\n\r\
             makedir  - create directory\n\r\
             move     - move file or directory\n\r\
             read     - show file contents in screen\n\r\
             time     - show time and date\n\r\n\r"
        ),
    );
}
