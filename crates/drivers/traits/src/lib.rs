//! Collaborator Traits for NANOS16
//!
//! This crate defines the trait interfaces the kernel dispatcher talks to.
//! The kernel routes service requests to these traits without knowing the
//! specific hardware layer or filesystem engine behind them.
//!
//! - [`Display`] - text-mode screen and cursor
//! - [`Keyboard`], [`SerialPort`] - input and COM1
//! - [`Rtc`] - BCD real time clock
//! - [`FarMemory`] - byte access to the far address space
//! - [`Storage`] - the filesystem engine
//!
//! [`Platform`] bundles all of them; any type implementing the six traits
//! is a platform.

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod far;
pub mod input;
pub mod storage;
pub mod video;

pub use clock::{bcd_to_int, BcdDateTime, Rtc};
pub use far::FarMemory;
pub use input::{Keyboard, SerialPort};
pub use storage::Storage;
pub use video::Display;

/// Everything the kernel needs from the machine
pub trait Platform: Display + Keyboard + SerialPort + Rtc + FarMemory + Storage {}

impl<T: Display + Keyboard + SerialPort + Rtc + FarMemory + Storage> Platform for T {}
