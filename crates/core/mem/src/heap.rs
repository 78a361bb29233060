//! Block Heap Allocator
//!
//! Fixed-granularity allocator for the low-memory heap arena. The arena is
//! split into `HEAP_MAX_BLOCK` equal blocks; a block table records which
//! blocks are in use and which allocation owns them.
//!
//! The allocator only hands out addresses. The arena bytes themselves are
//! plain memory at `base`, read and written directly by whoever owns the
//! allocation.
//!
//! Every block of an allocation stores the same owner address (the address
//! of the first block), which is what [`BlockHeap::free`] matches on. New
//! code should keep the [`HeapBlock`] handle and call [`BlockHeap::release`]
//! instead.

use crate::layout::{blocks_needed, HEAP_BASE, HEAP_BLOCK_SIZE, HEAP_MAX_BLOCK, HEAP_MEM_SIZE};

/// One entry of the block table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BlockSlot {
    in_use: bool,
    owner: Option<u16>,
}

impl BlockSlot {
    const FREE: BlockSlot = BlockSlot { in_use: false, owner: None };
}

/// Handle to a live heap allocation
///
/// Not `Clone`: releasing consumes the handle.
#[derive(Debug, PartialEq, Eq)]
pub struct HeapBlock {
    address: u16,
    first: usize,
    count: usize,
}

impl HeapBlock {
    /// Near address of the first byte of the allocation
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Number of blocks backing the allocation
    pub fn block_count(&self) -> usize {
        self.count
    }

    /// Usable size in bytes (whole blocks)
    pub fn size(&self) -> usize {
        self.count * HEAP_BLOCK_SIZE
    }
}

/// Block heap over a fixed arena
pub struct BlockHeap {
    /// Address of block 0
    base: u16,
    /// Block table
    slots: [BlockSlot; HEAP_MAX_BLOCK],
}

impl BlockHeap {
    /// Create a heap whose arena starts at `base`, with every block free
    pub const fn new(base: u16) -> Self {
        BlockHeap {
            base,
            slots: [BlockSlot::FREE; HEAP_MAX_BLOCK],
        }
    }

    /// Address of the first byte of the arena
    pub fn base(&self) -> u16 {
        self.base
    }

    /// Size of the arena in bytes
    pub fn arena_size(&self) -> usize {
        HEAP_MEM_SIZE
    }

    #[inline]
    fn block_addr(&self, index: usize) -> u16 {
        self.base.wrapping_add((index * HEAP_BLOCK_SIZE) as u16)
    }

    /// Allocate `size` bytes
    ///
    /// Scans the table from low to high addresses. As soon as the current
    /// run of free blocks is long enough, the `needed` blocks ending at the
    /// point of discovery are claimed. Returns `None` for a zero size or
    /// when no run is long enough.
    pub fn allocate(&mut self, size: usize) -> Option<HeapBlock> {
        if size == 0 {
            log::debug!("Mem alloc: zero-size request");
            return None;
        }

        let needed = blocks_needed(size);
        let mut run = 0usize;

        for i in 0..HEAP_MAX_BLOCK {
            if self.slots[i].in_use {
                run = 0;
                continue;
            }

            run += 1;
            if run >= needed {
                let first = i + 1 - needed;
                let address = self.block_addr(first);
                for slot in &mut self.slots[first..=i] {
                    slot.in_use = true;
                    slot.owner = Some(address);
                }
                return Some(HeapBlock { address, first, count: needed });
            }
        }

        log::warn!("Mem alloc: BAD ALLOC ({} bytes)", size);
        None
    }

    /// Release an allocation by handle
    ///
    /// Only the blocks the handle covers are inspected. Blocks that were
    /// already freed through [`BlockHeap::free`] (and possibly reused) are
    /// left alone.
    pub fn release(&mut self, block: HeapBlock) {
        let end = (block.first + block.count).min(HEAP_MAX_BLOCK);
        for slot in &mut self.slots[block.first..end] {
            if slot.in_use && slot.owner == Some(block.address) {
                *slot = BlockSlot::FREE;
            }
        }
    }

    /// Free an allocation by address
    ///
    /// Address 0 is the null pointer and is ignored. Freeing an address
    /// that owns nothing is a no-op.
    pub fn free(&mut self, address: u16) {
        if address == 0 {
            return;
        }

        for slot in self.slots.iter_mut() {
            if slot.in_use && slot.owner == Some(address) {
                *slot = BlockSlot::FREE;
            }
        }
    }

    /// Is block `index` in use
    pub fn is_used(&self, index: usize) -> bool {
        self.slots.get(index).map_or(false, |s| s.in_use)
    }

    /// Owner address stored in block `index`
    pub fn owner(&self, index: usize) -> Option<u16> {
        self.slots.get(index).and_then(|s| s.owner)
    }

    /// Current usage statistics
    pub fn stats(&self) -> HeapStats {
        let mut used = 0;
        let mut run = 0;
        let mut largest = 0;
        for slot in self.slots.iter() {
            if slot.in_use {
                used += 1;
                run = 0;
            } else {
                run += 1;
                largest = largest.max(run);
            }
        }

        HeapStats {
            used_blocks: used,
            free_blocks: HEAP_MAX_BLOCK - used,
            largest_free_run: largest,
        }
    }
}

impl Default for BlockHeap {
    fn default() -> Self {
        Self::new(HEAP_BASE)
    }
}

/// Heap usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Blocks currently allocated
    pub used_blocks: usize,
    /// Blocks available
    pub free_blocks: usize,
    /// Longest run of consecutive free blocks
    pub largest_free_run: usize,
}

impl HeapStats {
    /// Get usage percentage (0-100)
    pub fn usage_percent(&self) -> u8 {
        let total = self.used_blocks + self.free_blocks;
        if total == 0 {
            return 0;
        }
        ((self.used_blocks * 100) / total) as u8
    }

    /// Largest request (in bytes) that can currently succeed
    pub fn largest_allocation(&self) -> usize {
        self.largest_free_run * HEAP_BLOCK_SIZE
    }
}
