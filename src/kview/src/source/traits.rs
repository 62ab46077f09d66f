//! Memory Source Trait
//!
//! Core abstraction for reading memory from various sources.

use super::MemoryRegion;
use crate::error::{KernelError, Result};
use byteorder::{ByteOrder, LE};

/// Trait for reading kernel memory (live kcore, saved vmcore, test image)
pub trait MemorySource: Send + Sync {
    /// Read bytes from a kernel virtual address
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Get the list of memory regions
    fn regions(&self) -> &[MemoryRegion];

    /// Whether this source reflects the running kernel
    fn is_live(&self) -> bool;

    fn read_u8(&self, address: u64) -> Result<u8> {
        Ok(self.read_bytes(address, 1)?[0])
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(LE::read_u32(&bytes))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(LE::read_u64(&bytes))
    }

    /// Read a pointer from memory (64-bit kernels only)
    fn read_ptr(&self, address: u64) -> Result<u64> {
        self.read_u64(address)
    }

    /// Read a null-terminated string, stopping at `max_len` bytes
    ///
    /// Reads page by page so a short string near the end of a mapping
    /// does not fail because of bytes past its terminator.
    fn read_cstring(&self, address: u64, max_len: usize) -> Result<String> {
        let mut out = Vec::new();
        let mut cursor = address;
        while out.len() < max_len {
            let page_left = (0x1000 - (cursor & 0xfff)) as usize;
            let chunk = page_left.min(max_len - out.len());
            let bytes = self.read_bytes(cursor, chunk)?;
            if let Some(end) = bytes.iter().position(|&b| b == 0) {
                out.extend_from_slice(&bytes[..end]);
                return Ok(String::from_utf8_lossy(&out).to_string());
            }
            out.extend_from_slice(&bytes);
            match cursor.checked_add(chunk as u64) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        Ok(String::from_utf8_lossy(&out).to_string())
    }
}

/// Split a read into per-region pieces, failing on the first unmapped byte.
///
/// Returns `(region index, offset within region, length)` for each piece.
pub(crate) fn plan_read(
    regions: &[MemoryRegion],
    address: u64,
    size: usize,
) -> Result<Vec<(usize, u64, usize)>> {
    let mut pieces = Vec::new();
    let mut cursor = address;
    let mut remaining = size as u64;

    while remaining > 0 {
        let index = regions
            .iter()
            .position(|r| r.contains(cursor))
            .ok_or(KernelError::Unmapped(cursor))?;
        let region = &regions[index];
        let len = remaining.min(region.end - cursor);
        pieces.push((index, cursor - region.start, len as usize));
        cursor += len;
        remaining -= len;
    }

    Ok(pieces)
}
