//! Far Region Allocator
//!
//! Variable-size, address-ordered interval allocator for the far address
//! space `[FAR_MEM_START, FAR_MEM_LIMIT)`. The table keeps live regions
//! sorted by start address in a gap-free prefix; unused trailing entries are
//! zeroed. Free space is never stored, it is whatever lies between
//! consecutive entries.

use crate::layout::{far_align_up, is_far_addr, FAR_MEM_LIMIT, FAR_MEM_START, MAX_REGION};

/// A live far allocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Region {
    /// First far address of the region
    pub start: u32,
    /// Size in bytes, a multiple of `FAR_ALIGN`
    pub size: u32,
}

impl Region {
    const EMPTY: Region = Region { start: 0, size: 0 };

    /// One past the last address of the region
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.size
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Region table
pub struct RegionTable {
    entries: [Region; MAX_REGION],
}

impl RegionTable {
    /// Create an empty table
    pub const fn new() -> Self {
        RegionTable {
            entries: [Region::EMPTY; MAX_REGION],
        }
    }

    /// Number of live regions
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .position(Region::is_empty)
            .unwrap_or(MAX_REGION)
    }

    pub fn is_empty(&self) -> bool {
        self.entries[0].is_empty()
    }

    /// The table refuses new regions once its last slot is occupied
    pub fn is_full(&self) -> bool {
        !self.entries[MAX_REGION - 1].is_empty()
    }

    /// Live regions in address order
    pub fn regions(&self) -> &[Region] {
        &self.entries[..self.len()]
    }

    /// Total bytes held by live regions
    pub fn used_bytes(&self) -> u32 {
        self.regions().iter().map(|r| r.size).sum()
    }

    /// Allocate `size` bytes of far memory
    ///
    /// The size is rounded up to the alignment unit and placed in the first
    /// gap that fits: before the first region, between two regions, or
    /// after the last one (below `FAR_MEM_LIMIT`).
    pub fn allocate(&mut self, size: u32) -> Option<u32> {
        if size == 0 || self.is_full() {
            return None;
        }

        let Some(size) = far_align_up(size) else {
            log::warn!("LMem alloc: BAD ALLOC ({} bytes)", size);
            return None;
        };

        let count = self.len();
        let mut candidate = FAR_MEM_START;
        let mut slot = None;

        for (i, entry) in self.entries[..count].iter().enumerate() {
            let fits = entry
                .start
                .checked_sub(candidate)
                .map_or(false, |gap| gap >= size);
            if fits {
                slot = Some(i);
                break;
            }
            candidate = entry.end();
        }

        if slot.is_none() && candidate <= FAR_MEM_LIMIT && FAR_MEM_LIMIT - candidate >= size {
            slot = Some(count);
        }

        match slot {
            Some(index) => {
                // count < MAX_REGION here, so the shift never drops a live entry
                self.entries.copy_within(index..MAX_REGION - 1, index + 1);
                self.entries[index] = Region { start: candidate, size };
                Some(candidate)
            }
            None => {
                log::warn!("LMem alloc: BAD ALLOC ({} bytes)", size);
                None
            }
        }
    }

    /// Free the region starting at `address`
    ///
    /// Addresses outside the far space and addresses that start no region
    /// are ignored.
    pub fn free(&mut self, address: u32) {
        if !is_far_addr(address) {
            return;
        }

        let count = self.len();
        if let Some(index) = self.entries[..count].iter().position(|r| r.start == address) {
            self.entries.copy_within(index + 1..MAX_REGION, index);
            self.entries[MAX_REGION - 1] = Region::EMPTY;
        }
    }
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::new()
    }
}
