//! Mock Memory Source
//!
//! A flat, writable kernel image for building test fixtures.

use super::{MemoryRegion, MemorySource};
use crate::error::{KernelError, Result};

/// A mock memory source backed by one contiguous buffer
pub struct MockMemorySource {
    /// Raw memory data (contiguous, starting at base_address)
    pub data: Vec<u8>,
    /// Base virtual address for the data
    pub base_address: u64,
    /// Memory regions (for region-based operations)
    pub regions: Vec<MemoryRegion>,
}

impl MockMemorySource {
    /// Create a new mock with data at given base address
    pub fn new(data: Vec<u8>, base_address: u64) -> Self {
        let size = data.len() as u64;
        Self {
            data,
            base_address,
            regions: vec![MemoryRegion::new(base_address, size, 0)],
        }
    }

    /// Zero-filled image of `size` bytes
    pub fn zeroed(size: usize, base_address: u64) -> Self {
        Self::new(vec![0; size], base_address)
    }

    fn offset_of(&self, address: u64, size: usize) -> Option<usize> {
        let offset = address.checked_sub(self.base_address)? as usize;
        (offset.checked_add(size)? <= self.data.len()).then_some(offset)
    }

    /// Overwrite bytes at `address`; panics outside the image
    pub fn write_bytes(&mut self, address: u64, bytes: &[u8]) {
        let offset = self
            .offset_of(address, bytes.len())
            .unwrap_or_else(|| panic!("write of {} bytes at {:#x} outside mock", bytes.len(), address));
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn write_u64(&mut self, address: u64, value: u64) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    pub fn write_u32(&mut self, address: u64, value: u32) {
        self.write_bytes(address, &value.to_le_bytes());
    }
}

impl MemorySource for MockMemorySource {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let offset = self
            .offset_of(address, size)
            .ok_or(KernelError::Unmapped(address))?;
        Ok(self.data[offset..offset + size].to_vec())
    }

    fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    fn is_live(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_read_bytes() {
        let data = vec![0x41, 0x42, 0x43, 0x44]; // "ABCD"
        let source = MockMemorySource::new(data, 0x1000);

        let result = source.read_bytes(0x1000, 4).unwrap();
        assert_eq!(result, vec![0x41, 0x42, 0x43, 0x44]);

        let partial = source.read_bytes(0x1001, 2).unwrap();
        assert_eq!(partial, vec![0x42, 0x43]);
    }

    #[test]
    fn test_mock_source_read_u64() {
        let data = vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let source = MockMemorySource::new(data, 0x1000);

        let value = source.read_u64(0x1000).unwrap();
        assert_eq!(value, 0x0807060504030201); // Little-endian
    }

    #[test]
    fn test_mock_source_read_cstring() {
        let data = b"Hello\0World\0padding".to_vec();
        let source = MockMemorySource::new(data, 0x1000);

        assert_eq!(source.read_cstring(0x1000, 10).unwrap(), "Hello");
        assert_eq!(source.read_cstring(0x1006, 10).unwrap(), "World");
        // Truncated at max_len without a terminator
        assert_eq!(source.read_cstring(0x100c, 3).unwrap(), "pad");
    }

    #[test]
    fn test_mock_source_read_out_of_bounds() {
        let source = MockMemorySource::new(vec![0x41, 0x42, 0x43, 0x44], 0x1000);

        assert!(source.read_bytes(0x1002, 10).is_err());
        assert!(source.read_bytes(0x500, 4).is_err());
    }

    #[test]
    fn test_mock_source_write_then_read() {
        let mut source = MockMemorySource::zeroed(0x100, 0xffff_8880_0000_0000);
        source.write_u64(0xffff_8880_0000_0010, 0xdead_beef);
        source.write_u32(0xffff_8880_0000_0020, 7);

        assert_eq!(source.read_ptr(0xffff_8880_0000_0010).unwrap(), 0xdead_beef);
        assert_eq!(source.read_u32(0xffff_8880_0000_0020).unwrap(), 7);
        assert!(source.read_u8(0xffff_8880_0000_00ff).is_ok());
        assert!(source.read_u8(0xffff_8880_0000_0100).is_err());
        assert!(!source.is_live());
    }
}
