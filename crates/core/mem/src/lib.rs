//! NANOS16 Memory Management
//!
//! The kernel owns every dynamically managed byte of the machine:
//! - `layout` - Single source of truth for all memory addresses
//! - `heap` - Block heap over the small low-memory arena (near addresses)
//! - `region` - Address-ordered region allocator for far memory
//!
//! # Architecture
//!
//! ```text
//! layout.rs  ─── Defines all memory addresses (NO magic numbers elsewhere)
//!    │
//!    ├── heap.rs   ─── Fixed 64-byte blocks, 128-entry block table
//!    │
//!    └── region.rs ─── 64-entry sorted interval table, 16-byte alignment
//! ```
//!
//! Both allocators are plain owned values with fixed-size tables. Neither
//! allocates from the Rust heap and neither has a recovery path when its
//! table is exhausted: the request simply fails.
//!
//! # Usage
//!
//! ```rust
//! use nanos_mem::{BlockHeap, RegionTable};
//!
//! let mut heap = BlockHeap::default();
//! let block = heap.allocate(100).unwrap();
//! heap.release(block);
//!
//! let mut far = RegionTable::new();
//! let start = far.allocate(4096).unwrap();
//! far.free(start);
//! ```

#![cfg_attr(not(test), no_std)]

#[cfg(test)]
extern crate alloc;

pub mod layout;
pub mod heap;
pub mod region;

pub use layout::{HEAP_BASE, HEAP_BLOCK_SIZE, HEAP_MAX_BLOCK, HEAP_MEM_SIZE};
pub use layout::{FAR_ALIGN, FAR_MEM_LIMIT, FAR_MEM_START, MAX_REGION};
pub use layout::{PROGRAM_LOAD_ADDR, PROGRAM_MAX_SIZE};
pub use heap::{BlockHeap, HeapBlock, HeapStats};
pub use region::{Region, RegionTable};
