//! A program's view of the kernel: every call crosses the raw
//! `(opcode, param)` boundary before reaching the dispatcher.

mod common;

use std::cell::RefCell;

use common::{kernel, MockPlatform};
use nanos16::drivers::BcdDateTime;
use nanos16::mem::{FAR_MEM_START, HEAP_BASE};
use nanos16::syscall::numbers::*;
use nanos16::syscall::raw::{RawFsListRecord, RawGate};
use nanos16::syscall::syscalls::*;
use nanos16::syscall::{FsEntry, FsError, Request, Service};
use nanos16::Kernel;

thread_local! {
    static KERNEL: RefCell<Option<Kernel<MockPlatform>>> = RefCell::new(None);
}

unsafe extern "C" fn kernel_entry(service: u16, param: *mut u8) -> u16 {
    KERNEL.with(|k| {
        k.borrow_mut()
            .as_mut()
            .map_or(0, |k| k.service(Request::from_raw(service, param)))
    })
}

fn with_kernel<R>(f: impl FnOnce(&mut Kernel<MockPlatform>) -> R) -> R {
    KERNEL.with(|k| f(k.borrow_mut().as_mut().unwrap()))
}

fn boot(platform: MockPlatform) -> RawGate {
    KERNEL.with(|k| *k.borrow_mut() = Some(kernel(platform)));
    unsafe { RawGate::new(kernel_entry) }
}

#[test]
fn test_console_through_raw_entry() {
    let mut gate = boot(MockPlatform::new());

    assert_eq!(get_screen_size(&mut gate), (80, 50));
    putchar(&mut gate, b'A');
    putchar_attr(&mut gate, 1, 2, b'B', 0x07);
    set_cursor_position(&mut gate, 5, 6);
    let pos = get_cursor_position(&mut gate);
    assert_eq!((pos.x, pos.y), (5, 6));

    with_kernel(|k| {
        assert_eq!(k.platform().screen, b"A");
        assert_eq!(k.platform().cells, vec![(1, 2, b'B', 0x07)]);
    });
}

#[test]
fn test_memory_through_raw_entry() {
    let mut gate = boot(MockPlatform::new());

    let a = malloc(&mut gate, 10).unwrap();
    assert_eq!(a, HEAP_BASE);
    let b = malloc(&mut gate, 100).unwrap();
    assert_eq!(b, HEAP_BASE + 64);

    // MEM_FREE passes the address as the parameter itself
    mfree(&mut gate, a);
    assert_eq!(malloc(&mut gate, 64), Some(a));

    let far = lmalloc(&mut gate, 20).unwrap();
    assert_eq!(far, FAR_MEM_START);
    lmem_setbyte(&mut gate, far + 3, 0x5A);
    assert_eq!(lmem_getbyte(&mut gate, far + 3), 0x5A);
    lmfree(&mut gate, far);

    with_kernel(|k| {
        assert!(k.far().is_empty());
        assert_eq!(k.heap().stats().used_blocks, 3);
    });
}

#[test]
fn test_storage_through_raw_entry() {
    let mut gate = boot(MockPlatform::new().with_dir("etc").with_file("etc/motd", b"welcome\n"));

    let entry = get_entry(&mut gate, "/etc/motd").unwrap();
    assert!(entry.is_file());
    assert_eq!(entry.size, 8);

    let mut buf = [0u8; 16];
    assert_eq!(read_file(&mut gate, "/etc/motd", 0, &mut buf), Ok(8));
    assert_eq!(&buf[..8], b"welcome\n");

    assert_eq!(write_file(&mut gate, "/etc/new", 0, b"xyz", WRITE_FLAG_OVERWRITE), Ok(3));
    assert_eq!(create_directory(&mut gate, "/tmp"), Ok(0));
    assert_eq!(move_entry(&mut gate, "/etc/new", "/tmp/new"), Ok(0));
    assert_eq!(copy_entry(&mut gate, "/tmp/new", "/tmp/new"), Err(FsError::Exists));
    assert_eq!(delete(&mut gate, "/etc/motd"), Ok(0));

    let mut listed = FsEntry::default();
    assert_eq!(list(&mut gate, "/tmp", 0, &mut listed), Ok(1));
    assert_eq!(listed.name(), "new");
    assert_eq!(listed.size, 3);

    with_kernel(|k| {
        assert_eq!(k.platform().file("tmp/new"), Some(&b"xyz"[..]));
        assert!(!k.platform().exists("etc/motd"));
    });
}

#[test]
fn test_clock_through_raw_entry() {
    let mut platform = MockPlatform::new();
    platform.rtc = BcdDateTime { time: [0x08, 0x30, 0x00], date: [0x99, 0x01, 0x02] };
    let mut gate = boot(platform);

    let t = time(&mut gate);
    assert_eq!((t.year, t.month, t.day), (2099, 1, 2));
    assert_eq!((t.hour, t.minute, t.second), (8, 30, 0));
}

#[test]
fn test_null_records_answer_zero() {
    boot(MockPlatform::new());

    for op in [SYSCALL_IO_GET_SCREEN_SIZE, SYSCALL_FS_GET_ENTRY, SYSCALL_FAR_ALLOCATE, SYSCALL_CLK_GET_TIME] {
        assert_eq!(unsafe { kernel_entry(op, std::ptr::null_mut()) }, 0);
    }
    // Null scalar reads as 0: a zero-size allocation
    assert_eq!(unsafe { kernel_entry(SYSCALL_MEM_ALLOCATE, std::ptr::null_mut()) }, 0);

    with_kernel(|k| {
        assert_eq!(k.heap().stats().used_blocks, 0);
        assert!(k.far().is_empty());
    });
}

#[test]
fn test_unknown_opcode_through_raw_entry() {
    let mut gate = boot(MockPlatform::new());
    assert_eq!(gate.service(Request::Unsupported(0x4242)), 0);

    let mut byte = 0x41u8;
    assert_eq!(unsafe { kernel_entry(0x0B, &mut byte) }, 0);
    with_kernel(|k| assert!(k.platform().screen.is_empty()));
}

#[test]
fn test_non_utf8_path_is_rejected() {
    boot(MockPlatform::new().with_dir("docs").with_file("a.txt", b"abc"));

    let path = [0xFFu8, b'z', 0];
    let mut entry = FsEntry::default();
    let mut fl = RawFsListRecord { path: path.as_ptr(), index: 0, entry: &mut entry };
    let result = unsafe { kernel_entry(SYSCALL_FS_LIST, &mut fl as *mut _ as *mut u8) };
    assert!(result >= ERROR_ANY, "answered {:#x}", result);
    assert_eq!(result, ERROR_INVALID);
    assert_eq!(entry, FsEntry::default());

    let mut doomed = [0xC3u8, 0x28, 0];
    assert_eq!(unsafe { kernel_entry(SYSCALL_FS_DELETE, doomed.as_mut_ptr()) }, ERROR_INVALID);
    assert_eq!(unsafe { kernel_entry(SYSCALL_FS_CREATE_DIRECTORY, doomed.as_mut_ptr()) }, ERROR_INVALID);

    with_kernel(|k| {
        assert!(k.platform().exists("docs"));
        assert!(k.platform().exists("a.txt"));
        assert_eq!(k.platform().nodes.len(), 3);
    });
}
