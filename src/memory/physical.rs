//! Byte-level access to physical memory.

use super::Region;
use crate::constants::memory::REAL_MODE_LIMIT;
use x86_64::PhysAddr;

/// Source of the byte slices the loader reads into and scans.
pub trait PhysMemory {
    fn bytes(&self, base: PhysAddr, len: usize) -> Option<&[u8]>;
    fn bytes_mut(&mut self, base: PhysAddr, len: usize) -> Option<&mut [u8]>;

    fn region(&self, region: Region) -> Option<&[u8]> {
        self.bytes(region.base, region.size as usize)
    }

    fn region_mut(&mut self, region: Region) -> Option<&mut [u8]> {
        self.bytes_mut(region.base, region.size as usize)
    }
}

/// Real-mode memory seen through the identity mapping the firmware leaves
/// us in.
pub struct IdentityMemory {
    _private: (),
}

impl IdentityMemory {
    /// # Safety
    /// Must only be created while running in real mode (or with the low
    /// 1 MiB identity mapped), with no other owner of the regions accessed.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }

    fn check(base: PhysAddr, len: usize) -> Option<*mut u8> {
        let start = base.as_u64();
        // Address 0 is the interrupt vector table and not a valid pointer
        if start == 0 || start.checked_add(len as u64)? > REAL_MODE_LIMIT {
            return None;
        }
        Some(start as usize as *mut u8)
    }
}

impl PhysMemory for IdentityMemory {
    fn bytes(&self, base: PhysAddr, len: usize) -> Option<&[u8]> {
        let ptr = Self::check(base, len)?;
        Some(unsafe { core::slice::from_raw_parts(ptr, len) })
    }

    fn bytes_mut(&mut self, base: PhysAddr, len: usize) -> Option<&mut [u8]> {
        let ptr = Self::check(base, len)?;
        Some(unsafe { core::slice::from_raw_parts_mut(ptr, len) })
    }
}

/// A window of simulated physical memory starting at `origin`.
pub struct BufferMemory<'a> {
    origin: PhysAddr,
    bytes: &'a mut [u8],
}

impl<'a> BufferMemory<'a> {
    pub fn new(origin: PhysAddr, bytes: &'a mut [u8]) -> Self {
        Self { origin, bytes }
    }

    fn range(&self, base: PhysAddr, len: usize) -> Option<core::ops::Range<usize>> {
        let start = base.as_u64().checked_sub(self.origin.as_u64())? as usize;
        let end = start.checked_add(len)?;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

impl PhysMemory for BufferMemory<'_> {
    fn bytes(&self, base: PhysAddr, len: usize) -> Option<&[u8]> {
        let range = self.range(base, len)?;
        Some(&self.bytes[range])
    }

    fn bytes_mut(&mut self, base: PhysAddr, len: usize) -> Option<&mut [u8]> {
        let range = self.range(base, len)?;
        Some(&mut self.bytes[range])
    }
}
