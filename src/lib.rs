//! NANOS16 kernel core
//!
//! Resource management and service dispatch for a single-address-space
//! 16-bit kernel:
//! - [`Kernel`] owns the block heap, the far region table and the platform
//! - `dispatch` implements [`Service`](nanos_syscall::Service) for it, the
//!   one boundary every subsystem and every loaded program goes through
//! - [`shell::Shell`] is the integrated command line, and the only caller of
//!   the program loader
//!
//! Hardware, storage and clock access are reached through the traits of
//! `nanos-driver-traits`, so the whole kernel runs against a mock platform
//! in tests.

#![cfg_attr(not(test), no_std)]

pub mod config;
mod dispatch;
pub mod kernel;
pub mod logger;
pub mod shell;

pub use config::KernelConfig;
pub use kernel::{Kernel, KernelControl};
pub use logger::SerialLogger;
pub use shell::Shell;

pub use nanos_driver_traits as drivers;
pub use nanos_mem as mem;
pub use nanos_process as process;
pub use nanos_syscall as syscall;
