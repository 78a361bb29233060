//! Far Memory Access Trait
//!
//! Byte access to the far address space. The region allocator only hands
//! out addresses; reading and writing them is the platform's job.

pub trait FarMemory {
    fn far_read(&self, address: u32) -> u8;
    fn far_write(&mut self, address: u32, value: u8);
}
