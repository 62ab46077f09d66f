//! Memory Region Types
//!
//! Loadable segments of a kernel core image.

/// A virtual address range backed by bytes at `offset` in the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: u64,
    pub end: u64,
    pub offset: u64,
}

impl MemoryRegion {
    pub fn new(start: u64, size: u64, offset: u64) -> Self {
        MemoryRegion {
            start,
            end: start.saturating_add(size),
            offset,
        }
    }

    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.start && address < self.end
    }
}
