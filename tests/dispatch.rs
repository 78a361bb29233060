//! Integration tests for the service dispatcher

mod common;

use common::{kernel, MockPlatform};
use nanos16::drivers::BcdDateTime;
use nanos16::mem::{HEAP_BASE, HEAP_MEM_SIZE, FAR_MEM_START, MAX_REGION};
use nanos16::syscall::numbers::*;
use nanos16::syscall::syscalls::*;
use nanos16::syscall::{CharAttr, CursorMode, FarMemRecord, FsEntry, FsError, KeyMode, Position, Request, Service, Time};
use nanos16::KernelControl;

#[test]
fn test_screen_requests() {
    let mut k = kernel(MockPlatform::new());

    assert_eq!(get_screen_size(&mut k), (80, 50));

    putchar(&mut k, b'h');
    putchar(&mut k, b'i');
    putchar_attr(&mut k, 3, 4, b'X', 0x1F);
    set_cursor_position(&mut k, 10, 20);
    assert_eq!(get_cursor_position(&mut k), Position { x: 10, y: 20 });

    clear_screen(&mut k);
    set_show_cursor(&mut k, CursorMode::Hide);

    let p = k.platform();
    assert_eq!(p.screen, b"hi");
    assert_eq!(p.cells, vec![(3, 4, b'X', 0x1F)]);
    assert_eq!(p.clears, 1);
    assert!(!p.cursor_visible);
}

#[test]
fn test_out_char_attr_leaves_cursor() {
    let mut k = kernel(MockPlatform::new());
    set_cursor_position(&mut k, 1, 1);
    let result = k.service(Request::OutCharAttr(CharAttr { x: 7, y: 8, c: b'#', attr: 0x4E }));
    assert_eq!(result, 0);
    assert_eq!(k.platform().cursor, (1, 1));
}

#[test]
fn test_in_key_poll_returns_zero_when_idle() {
    let mut k = kernel(MockPlatform::new());
    assert_eq!(getkey(&mut k, KeyMode::Poll), 0);
    assert_eq!(k.platform().polls, 1);
}

#[test]
fn test_in_key_wait_spins_until_key() {
    let mut platform = MockPlatform::new();
    platform.keys.extend([0, 0, 0x1E61]);
    let mut k = kernel(platform);

    assert_eq!(getkey(&mut k, KeyMode::Wait), 0x1E61);
    assert_eq!(k.platform().polls, 3);
}

#[test]
fn test_serial_requests() {
    let mut platform = MockPlatform::new();
    platform.serial_in.push_back(b'z');
    let mut k = kernel(platform);

    sputchar(&mut k, b'a');
    assert_eq!(sgetchar(&mut k), b'z');
    assert_eq!(k.platform().serial_out, b"a");
}

#[test]
fn test_debug_char_follows_serial_debug() {
    let mut k = kernel(MockPlatform::new());

    debugchar(&mut k, b'x');
    assert!(k.platform().serial_out.is_empty());

    k.set_serial_debug(true);
    debugchar(&mut k, b'y');
    assert_eq!(k.platform().serial_out, b"y");

    k.set_serial_debug(false);
    debugchar(&mut k, b'z');
    assert_eq!(k.platform().serial_out, b"y");
}

#[test]
fn test_clock_decodes_bcd() {
    let mut platform = MockPlatform::new();
    platform.rtc = BcdDateTime { time: [0x23, 0x59, 0x07], date: [0x24, 0x12, 0x31] };
    let mut k = kernel(platform);

    assert_eq!(
        time(&mut k),
        Time { year: 2024, month: 12, day: 31, hour: 23, minute: 59, second: 7 }
    );
}

#[test]
fn test_unknown_opcode_changes_nothing() {
    let mut k = kernel(MockPlatform::new().with_file("a.txt", b"abc"));
    let held = malloc(&mut k, 100).unwrap();
    let far = lmalloc(&mut k, 64).unwrap();

    let platform_before = k.platform().clone();
    let heap_before = k.heap().stats();
    let far_before = k.far().regions().to_vec();

    for op in [0x0B, 0x1A, 0x26, 0x31, 0x7777, 0xFFFF] {
        assert_eq!(unsafe { k.service(Request::from_raw(op, core::ptr::null_mut())) }, 0);
        assert_eq!(k.service(Request::Unsupported(op)), 0);
    }

    assert_eq!(*k.platform(), platform_before);
    assert_eq!(k.heap().stats(), heap_before);
    assert_eq!(k.far().regions(), &far_before[..]);
    assert!(held >= HEAP_BASE);
    assert!(far >= FAR_MEM_START);
}

#[test]
fn test_mem_allocate_free_round_trip() {
    let mut k = kernel(MockPlatform::new());

    let x = malloc(&mut k, 1).unwrap();
    assert_eq!(x, HEAP_BASE);
    mfree(&mut k, x);

    // The whole arena is free again
    let y = k.service(Request::MemAllocate { size: HEAP_MEM_SIZE as u16 });
    assert_eq!(y, x);

    assert_eq!(k.service(Request::MemAllocate { size: 1 }), 0);
    mfree(&mut k, y);
    assert_eq!(k.heap().stats().used_blocks, 0);
}

#[test]
fn test_mem_allocate_zero_is_refused() {
    let mut k = kernel(MockPlatform::new());
    assert_eq!(malloc(&mut k, 0), None);
    assert_eq!(k.heap().stats().used_blocks, 0);
}

#[test]
fn test_mem_free_unknown_address_is_ignored() {
    let mut k = kernel(MockPlatform::new());
    let a = malloc(&mut k, 64).unwrap();
    mfree(&mut k, 0);
    mfree(&mut k, a + 1);
    assert_eq!(k.heap().stats().used_blocks, 1);
}

#[test]
fn test_far_allocate_and_free() {
    let mut k = kernel(MockPlatform::new());

    let s0 = lmalloc(&mut k, 10).unwrap();
    assert_eq!(s0, FAR_MEM_START);
    let s1 = lmalloc(&mut k, 5).unwrap();
    assert_eq!(s1, s0 + 16);

    lmfree(&mut k, s0);
    let regions = k.far().regions();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].start, s0 + 16);

    // The gap before the first region is reused
    assert_eq!(lmalloc(&mut k, 16), Some(s0));
}

#[test]
fn test_far_allocate_record() {
    let mut k = kernel(MockPlatform::new());

    let mut lm = FarMemRecord { address: 0xDEAD, n: 0 };
    assert_eq!(k.service(Request::FarAllocate(&mut lm)), 0);
    assert_eq!(lm.address, 0);

    lm.n = 100;
    k.service(Request::FarAllocate(&mut lm));
    assert_eq!(lm.address, FAR_MEM_START);
    assert_eq!(k.far().regions()[0].size, 112);
}

#[test]
fn test_far_table_fullness() {
    let mut k = kernel(MockPlatform::new());

    let starts: Vec<u32> = (0..MAX_REGION).map(|_| lmalloc(&mut k, 16).unwrap()).collect();
    assert_eq!(lmalloc(&mut k, 16), None);

    lmfree(&mut k, starts[10]);
    assert_eq!(lmalloc(&mut k, 16), Some(starts[10]));
}

#[test]
fn test_far_bytes() {
    let mut k = kernel(MockPlatform::new());
    let base = lmalloc(&mut k, 32).unwrap();

    lmem_setbyte(&mut k, base, 0xAB);
    assert_eq!(lmem_getbyte(&mut k, base), 0xAB);
    assert_eq!(k.service(Request::FarGetByte { address: base + 1 }), 0);

    assert_eq!(lmemset(&mut k, base, 7, 4), 4);
    assert_eq!(lmemcpy(&mut k, base + 16, base, 4), 4);
    let copied: Vec<u8> = (0..4).map(|i| lmem_getbyte(&mut k, base + 16 + i)).collect();
    assert_eq!(copied, vec![7, 7, 7, 7]);
}

#[test]
fn test_storage_requests() {
    let mut k = kernel(MockPlatform::new().with_dir("docs").with_file("docs/a.txt", b"hello"));

    let entry = get_entry(&mut k, "docs/a.txt").unwrap();
    assert!(entry.is_file());
    assert_eq!(entry.name(), "a.txt");
    assert_eq!(entry.size, 5);

    let mut buf = [0u8; 8];
    assert_eq!(read_file(&mut k, "docs/a.txt", 1, &mut buf), Ok(4));
    assert_eq!(&buf[..4], b"ello");

    assert_eq!(write_file(&mut k, "docs/a.txt", 0, b"!", WRITE_FLAG_APPEND), Ok(1));
    assert_eq!(k.platform().file("docs/a.txt"), Some(&b"hello!"[..]));

    assert_eq!(create_directory(&mut k, "docs"), Err(FsError::Exists));
    assert_eq!(create_directory(&mut k, "bin"), Ok(0));
    assert_eq!(copy_entry(&mut k, "docs/a.txt", "bin/b.txt"), Ok(0));
    assert_eq!(move_entry(&mut k, "bin/b.txt", "bin/c.txt"), Ok(0));
    assert!(k.platform().exists("bin/c.txt"));
    assert!(!k.platform().exists("bin/b.txt"));

    assert_eq!(delete(&mut k, "bin"), Ok(0));
    assert_eq!(delete(&mut k, "bin"), Err(FsError::NotFound));

    let mut listed = FsEntry::default();
    assert_eq!(list(&mut k, "/", 0, &mut listed), Ok(1));
    assert_eq!(listed.name(), "docs");
    assert!(listed.is_dir());
    assert_eq!(listed.size, 1);
}

#[test]
fn test_entries_carry_modification_time() {
    let stamp = Time { year: 2023, month: 11, day: 30, hour: 22, minute: 1, second: 0 };
    let mut k = kernel(MockPlatform::new().with_file("log", b"x").with_time("log", stamp));

    let entry = get_entry(&mut k, "log").unwrap();
    assert_eq!(entry.modified(), stamp);

    let mut listed = FsEntry::default();
    assert_eq!(list(&mut k, "/", 0, &mut listed), Ok(1));
    assert_eq!(listed.time, stamp.to_fs_time());
}

#[test]
fn test_storage_error_codes_pass_through() {
    let mut k = kernel(MockPlatform::new());
    let mut entry = FsEntry::default();

    let code = k.service(Request::FsGetEntry { path: "nope", parent: UNKNOWN_VALUE, disk: UNKNOWN_VALUE, entry: &mut entry });
    assert_eq!(code, ERROR_NOT_FOUND);
    assert!(code >= ERROR_ANY);

    assert_eq!(k.service(Request::FsFormat { disk: 3 }), ERROR_INVALID);
}

#[test]
fn test_fsinfo_and_format() {
    let mut k = kernel(
        MockPlatform::new()
            .with_disk("fd0", FS_TYPE_NSFS, 2880, 1)
            .with_disk("hd0", FS_TYPE_NSFS, 4096, 2)
            .with_file("hd0/x", b"1")
            .with_file("y", b"2"),
    );

    let info = get_fsinfo(&mut k, 1).unwrap();
    assert_eq!(info.name(), "hd0");
    assert_eq!(info.id, 0x80);
    assert_eq!(info.fs_type, FS_TYPE_NSFS);
    assert_eq!(get_fsinfo(&mut k, 2), Err(FsError::NotFound));

    // FS_FORMAT takes the BIOS id, not the info index
    assert_eq!(format(&mut k, 1), Err(FsError::Invalid));
    assert_eq!(format(&mut k, 0x80), Ok(0));
    assert_eq!(k.platform().formats, vec![0x80]);
    assert!(k.platform().exists("hd0"));
    assert!(!k.platform().exists("hd0/x"));
    assert!(k.platform().exists("y"));
}

#[test]
fn test_boot_sequence() {
    let mut k = kernel(MockPlatform::new());
    k.boot();

    let p = k.platform();
    assert!(p.cursor_visible);
    assert_eq!(p.clears, 1);
    assert_eq!(p.screen, b"Starting...\n\r");
}
