//! NANOS16 Memory Layout - Single Source of Truth
//!
//! ALL memory addresses and sizes are defined here.
//! NO magic numbers anywhere else in the codebase.
//!
//! # Near Segment (16-bit addresses, what the kernel and programs see)
//!
//! ```text
//! 0x0000 - 0x9FFF   Kernel code, data and stack
//! 0xA000 - 0xBFFF   Block heap arena (8KB)        MEM_ALLOCATE / MEM_FREE
//! 0xC000 - 0xCFFF   Reserved
//! 0xD000 - 0xFFFF   Program slot                  One foreground program
//! ```
//!
//! # Far Address Space (32-bit linear addresses)
//!
//! ```text
//! 0x010000 - 0x10FFFF   Region allocator space (1MB)   FAR_ALLOCATE / FAR_FREE
//! ```

#![allow(dead_code)]

// =============================================================================
// Block Heap
// =============================================================================

/// Number of slots in the block table
pub const HEAP_MAX_BLOCK: usize = 0x0080;

/// Size of the heap arena in bytes
pub const HEAP_MEM_SIZE: usize = 0x2000;

/// Size of a single heap block
pub const HEAP_BLOCK_SIZE: usize = HEAP_MEM_SIZE / HEAP_MAX_BLOCK;

/// Near address of the first byte of the heap arena
pub const HEAP_BASE: u16 = 0xA000;

// =============================================================================
// Far Regions
// =============================================================================

/// First address handed out by the region allocator
pub const FAR_MEM_START: u32 = 0x0001_0000;

/// Region address space ceiling (exclusive)
pub const FAR_MEM_LIMIT: u32 = 0x0011_0000;

/// Region sizes are multiples of this (one paragraph)
pub const FAR_ALIGN: u32 = 0x10;

/// Number of descriptors in the region table
pub const MAX_REGION: usize = 64;

// =============================================================================
// Program Slot
// =============================================================================

/// Near address where the foreground program image is loaded
pub const PROGRAM_LOAD_ADDR: u16 = 0xD000;

/// Top of addressable near memory
pub const NEAR_MEM_TOP: u16 = 0xFFFF;

/// Largest image the program slot can hold
pub const PROGRAM_MAX_SIZE: usize = (NEAR_MEM_TOP - PROGRAM_LOAD_ADDR) as usize;

// =============================================================================
// Helper Functions
// =============================================================================

/// Number of heap blocks needed to hold `size` bytes
#[inline]
pub const fn blocks_needed(size: usize) -> usize {
    (size + HEAP_BLOCK_SIZE - 1) / HEAP_BLOCK_SIZE
}

/// Round a far allocation size up to the region alignment unit
///
/// Returns `None` if rounding would overflow.
#[inline]
pub const fn far_align_up(size: u32) -> Option<u32> {
    match size.checked_add(FAR_ALIGN - 1) {
        Some(s) => Some(s & !(FAR_ALIGN - 1)),
        None => None,
    }
}

/// Check if a far address lies in the region allocator space
#[inline]
pub const fn is_far_addr(addr: u32) -> bool {
    addr >= FAR_MEM_START && addr < FAR_MEM_LIMIT
}
