//! NANOS16 bare-metal kernel
//!
//! Binds the kernel core to the BIOS hardware layer and the filesystem
//! engine, both linked in as `extern "C"` functions, installs the raw
//! service entry and runs the shell.

#![no_std]
#![no_main]

extern crate alloc;

use alloc::vec::Vec;
use core::panic::PanicInfo;
use core::ptr::addr_of_mut;

use linked_list_allocator::LockedHeap;
use spin::Mutex;

use nanos16::drivers::{BcdDateTime, Display, FarMemory, Keyboard, Rtc, SerialPort, Storage};
use nanos16::mem::{PROGRAM_LOAD_ADDR, PROGRAM_MAX_SIZE};
use nanos16::process::{EntryPoint, ProgramLoader};
use nanos16::syscall::raw::PATH_BUFFER_SIZE;
use nanos16::syscall::types::copy_bounded;
use nanos16::syscall::{FsEntry, FsError, FsInfo, FsResult, Request, Service};
use nanos16::{Kernel, KernelConfig, KernelControl, SerialLogger, Shell};

#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Pool behind the Rust allocator (program argument copies)
const KERNEL_POOL_SIZE: usize = 0x800;
static mut KERNEL_POOL: [u8; KERNEL_POOL_SIZE] = [0; KERNEL_POOL_SIZE];

/// The kernel context, locked per request
static KERNEL: Mutex<Option<Kernel<BiosPlatform>>> = Mutex::new(None);

static LOGGER: SerialLogger = SerialLogger::new(serial_sink);

// Hardware layer and filesystem engine
extern "C" {
    fn io_clear_screen();
    fn io_out_char(c: u8);
    fn io_out_char_attr(x: u16, y: u16, c: u8, attr: u8);
    fn io_set_cursor_pos(x: u16, y: u16);
    fn io_get_cursor_pos(x: *mut u16, y: *mut u16);
    fn io_show_cursor();
    fn io_hide_cursor();
    fn io_in_key() -> u16;
    fn io_out_char_serial(c: u8);
    fn io_in_char_serial() -> u8;
    fn io_serial_status() -> u8;
    fn boot_drive() -> u8;
    fn get_time(bcd_time: *mut u8, bcd_date: *mut u8);
    fn lmem_getbyte(address: u32) -> u8;
    fn lmem_setbyte(address: u32, value: u8);

    fn fs_get_info(disk_index: u16, info: *mut FsInfo) -> u16;
    fn fs_get_entry(entry: *mut FsEntry, path: *const u8, parent: u16, disk: u16) -> u16;
    fn fs_read_file(buffer: *mut u8, path: *const u8, offset: u16, count: u16) -> u16;
    fn fs_write_file(buffer: *const u8, path: *const u8, offset: u16, count: u16, flags: u16) -> u16;
    fn fs_move(src: *const u8, dst: *const u8) -> u16;
    fn fs_copy(src: *const u8, dst: *const u8) -> u16;
    fn fs_delete(path: *const u8) -> u16;
    fn fs_create_directory(path: *const u8) -> u16;
    fn fs_list(entry: *mut FsEntry, path: *const u8, index: u16) -> u16;
    fn fs_format(disk: u16) -> u16;
}

fn serial_sink(c: u8) {
    unsafe { io_out_char_serial(c) }
}

/// Run `f` with a NUL terminated copy of `path`
fn with_c_path<R>(path: &str, f: impl FnOnce(*const u8) -> R) -> R {
    let mut buf = [0u8; PATH_BUFFER_SIZE];
    copy_bounded(&mut buf, path.as_bytes());
    f(buf.as_ptr())
}

fn clamp_len(len: usize) -> u16 {
    len.min(u16::MAX as usize) as u16
}

/// The PC BIOS machine
struct BiosPlatform;

impl Display for BiosPlatform {
    fn clear_screen(&mut self) {
        unsafe { io_clear_screen() }
    }

    fn out_char(&mut self, c: u8) {
        unsafe { io_out_char(c) }
    }

    fn out_char_attr(&mut self, x: u16, y: u16, c: u8, attr: u8) {
        unsafe { io_out_char_attr(x, y, c, attr) }
    }

    fn set_cursor_pos(&mut self, x: u16, y: u16) {
        unsafe { io_set_cursor_pos(x, y) }
    }

    fn cursor_pos(&self) -> (u16, u16) {
        let (mut x, mut y) = (0, 0);
        unsafe { io_get_cursor_pos(&mut x, &mut y) };
        (x, y)
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        unsafe {
            if visible {
                io_show_cursor()
            } else {
                io_hide_cursor()
            }
        }
    }
}

impl Keyboard for BiosPlatform {
    fn poll_key(&mut self) -> u16 {
        unsafe { io_in_key() }
    }
}

impl SerialPort for BiosPlatform {
    fn serial_write(&mut self, c: u8) {
        serial_sink(c)
    }

    fn serial_read(&mut self) -> u8 {
        unsafe { io_in_char_serial() }
    }

    fn line_status(&self) -> u8 {
        unsafe { io_serial_status() }
    }
}

impl Rtc for BiosPlatform {
    fn read_rtc(&mut self) -> BcdDateTime {
        let mut bcd = BcdDateTime::default();
        unsafe { get_time(bcd.time.as_mut_ptr(), bcd.date.as_mut_ptr()) };
        bcd
    }
}

impl FarMemory for BiosPlatform {
    fn far_read(&self, address: u32) -> u8 {
        unsafe { lmem_getbyte(address) }
    }

    fn far_write(&mut self, address: u32, value: u8) {
        unsafe { lmem_setbyte(address, value) }
    }
}

impl Storage for BiosPlatform {
    fn info(&mut self, disk_index: u16, info: &mut FsInfo) -> FsResult<u16> {
        FsError::check(unsafe { fs_get_info(disk_index, info) })
    }

    fn get_entry(&mut self, path: &str, parent: u16, disk: u16, entry: &mut FsEntry) -> FsResult<u16> {
        FsError::check(with_c_path(path, |p| unsafe { fs_get_entry(entry, p, parent, disk) }))
    }

    fn read_file(&mut self, path: &str, offset: u16, buffer: &mut [u8]) -> FsResult<u16> {
        let count = clamp_len(buffer.len());
        FsError::check(with_c_path(path, |p| unsafe { fs_read_file(buffer.as_mut_ptr(), p, offset, count) }))
    }

    fn write_file(&mut self, path: &str, offset: u16, buffer: &[u8], flags: u16) -> FsResult<u16> {
        let count = clamp_len(buffer.len());
        FsError::check(with_c_path(path, |p| unsafe {
            fs_write_file(buffer.as_ptr(), p, offset, count, flags)
        }))
    }

    fn move_entry(&mut self, src: &str, dst: &str) -> FsResult<u16> {
        FsError::check(with_c_path(src, |s| with_c_path(dst, |d| unsafe { fs_move(s, d) })))
    }

    fn copy_entry(&mut self, src: &str, dst: &str) -> FsResult<u16> {
        FsError::check(with_c_path(src, |s| with_c_path(dst, |d| unsafe { fs_copy(s, d) })))
    }

    fn delete(&mut self, path: &str) -> FsResult<u16> {
        FsError::check(with_c_path(path, |p| unsafe { fs_delete(p) }))
    }

    fn create_directory(&mut self, path: &str) -> FsResult<u16> {
        FsError::check(with_c_path(path, |p| unsafe { fs_create_directory(p) }))
    }

    fn list(&mut self, path: &str, index: u16, entry: &mut FsEntry) -> FsResult<u16> {
        FsError::check(with_c_path(path, |p| unsafe { fs_list(entry, p, index) }))
    }

    fn format(&mut self, disk: u16) -> FsResult<u16> {
        FsError::check(unsafe { fs_format(disk) })
    }
}

/// Raw service entry, reached by programs with `(opcode, param)`
///
/// # Safety
/// `param` must match the record the opcode expects.
#[no_mangle]
pub unsafe extern "C" fn kernel_service(service: u16, param: *mut u8) -> u16 {
    let request = Request::from_raw(service, param);
    match KERNEL.lock().as_mut() {
        Some(kernel) => kernel.service(request),
        None => 0,
    }
}

/// The shell's handle on the kernel: takes the lock for each request only
struct KernelEntry;

impl Service for KernelEntry {
    fn service(&mut self, request: Request<'_>) -> u16 {
        match KERNEL.lock().as_mut() {
            Some(kernel) => kernel.service(request),
            None => 0,
        }
    }
}

impl KernelControl for KernelEntry {
    fn serial_debug(&self) -> bool {
        KERNEL.lock().as_ref().map_or(false, |k| k.serial_debug())
    }

    fn set_serial_debug(&mut self, enabled: bool) {
        if let Some(kernel) = KERNEL.lock().as_mut() {
            kernel.set_serial_debug(enabled);
        }
    }

    fn system_disk(&self) -> u16 {
        KERNEL.lock().as_ref().map_or(0, |k| k.system_disk())
    }

    fn serial_status(&self) -> u8 {
        KERNEL.lock().as_ref().map_or(0, |k| k.serial_status())
    }
}

/// Program entry: `main(argc, argv)` at the start of the image
type ProgramMain = unsafe extern "C" fn(argc: u16, argv: *const *const u8) -> u16;

/// Far call into the program slot
struct SlotEntry;

impl EntryPoint for SlotEntry {
    fn call(&mut self, image: &[u8], args: &[&str], _services: &mut dyn Service) -> u16 {
        // Programs reach the kernel through kernel_service, not through `_services`
        let strings: Vec<Vec<u8>> = args
            .iter()
            .map(|arg| {
                let mut s = Vec::with_capacity(arg.len() + 1);
                s.extend_from_slice(arg.as_bytes());
                s.push(0);
                s
            })
            .collect();
        let argv: Vec<*const u8> = strings.iter().map(|s| s.as_ptr()).collect();

        unsafe {
            let main: ProgramMain = core::mem::transmute(image.as_ptr());
            main(argv.len() as u16, argv.as_ptr())
        }
    }
}

#[no_mangle]
pub extern "C" fn kernel_main() -> ! {
    unsafe {
        ALLOCATOR
            .lock()
            .init(addr_of_mut!(KERNEL_POOL) as *mut u8, KERNEL_POOL_SIZE);
    }

    let config = KernelConfig {
        system_disk: u16::from(unsafe { boot_drive() }),
        ..Default::default()
    };
    let _ = nanos16::logger::init(&LOGGER, config.serial_debug);

    let mut kernel = Kernel::new(BiosPlatform, config);
    kernel.boot();
    *KERNEL.lock() = Some(kernel);

    let slot = unsafe { core::slice::from_raw_parts_mut(PROGRAM_LOAD_ADDR as usize as *mut u8, PROGRAM_MAX_SIZE) };
    let mut shell = Shell::new(ProgramLoader::new(slot), SlotEntry);
    shell.run(&mut KernelEntry)
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    use core::fmt::Write;

    struct Serial;
    impl Write for Serial {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            s.bytes().for_each(serial_sink);
            Ok(())
        }
    }

    let _ = write!(Serial, "KERNEL PANIC!\n\r");
    if let Some(location) = info.location() {
        let _ = write!(Serial, "  at {}:{}\n\r", location.file(), location.line());
    }
    loop {
        core::hint::spin_loop();
    }
}
