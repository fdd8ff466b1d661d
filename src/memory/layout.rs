//! Named real-mode regions and the startup overlap check.

use crate::constants::memory::*;
use core::fmt;
use x86_64::PhysAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Loader,
    Directory,
    Stack,
    Stage2,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::Loader => write!(f, "loader"),
            RegionKind::Directory => write!(f, "directory buffer"),
            RegionKind::Stack => write!(f, "stack"),
            RegionKind::Stage2 => write!(f, "stage 2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    Empty(RegionKind),
    AboveRealMode(RegionKind),
    Overlap(RegionKind, RegionKind),
    /// The loader region must hold a whole boot sector
    LoaderTooSmall,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Empty(kind) => write!(f, "{} region is empty", kind),
            LayoutError::AboveRealMode(kind) => write!(f, "{} region crosses the 1 MiB boundary", kind),
            LayoutError::Overlap(a, b) => write!(f, "{} region overlaps {} region", a, b),
            LayoutError::LoaderTooSmall => write!(f, "loader region smaller than a boot sector"),
        }
    }
}

/// A contiguous physical range `[base, base + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub base: PhysAddr,
    pub size: u64,
}

impl Region {
    pub fn new(base: u64, size: u64) -> Self {
        Self {
            base: PhysAddr::new(base),
            size,
        }
    }

    /// One past the last byte, saturating at `u64::MAX`.
    pub fn end(&self) -> u64 {
        self.checked_end().unwrap_or(u64::MAX)
    }

    pub fn checked_end(&self) -> Option<u64> {
        self.base.as_u64().checked_add(self.size)
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.base.as_u64() < other.end() && other.base.as_u64() < self.end()
    }}

/// Where the first stage keeps its code, its scan buffer, its stack and
/// the second stage it loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    pub loader: Region,
    pub directory: Region,
    pub stack: Region,
    pub stage2: Region,
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self {
            loader: Region::new(LOADER_BASE, LOADER_SIZE),
            directory: Region::new(DIRECTORY_BASE, DIRECTORY_SIZE),
            stack: Region::new(STACK_BASE, STACK_SIZE),
            stage2: Region::new(STAGE2_BASE, STAGE2_SIZE),
        }
    }
}

impl MemoryLayout {
    fn regions(&self) -> [(RegionKind, Region); 4] {
        [
            (RegionKind::Loader, self.loader),
            (RegionKind::Directory, self.directory),
            (RegionKind::Stack, self.stack),
            (RegionKind::Stage2, self.stage2),
        ]
    }

    /// Every region non-empty, below 1 MiB, and disjoint from every other.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let regions = self.regions();

        for (kind, region) in regions {
            if region.size == 0 {
                return Err(LayoutError::Empty(kind));
            }
            if region.checked_end().map_or(true, |end| end > REAL_MODE_LIMIT) {
                return Err(LayoutError::AboveRealMode(kind));
            }
        }

        for (i, (kind, region)) in regions.iter().enumerate() {
            for (other_kind, other) in &regions[i + 1..] {
                if region.overlaps(other) {
                    return Err(LayoutError::Overlap(*kind, *other_kind));
                }
            }
        }

        if self.loader.size < LOADER_SIZE {
            return Err(LayoutError::LoaderTooSmall);
        }

        Ok(())
    }
}

/// Segment:offset form of a real-mode address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealModePtr {
    pub segment: u16,
    pub offset: u16,
}

impl RealModePtr {
    /// Normalized pointer: offset keeps the low 4 bits, segment the rest.
    /// `None` above the real-mode limit.
    pub fn from_phys(addr: PhysAddr) -> Option<Self> {
        let linear = addr.as_u64();
        if linear >= REAL_MODE_LIMIT {
            return None;
        }
        Some(Self {
            segment: (linear >> 4) as u16,
            offset: (linear & 0xF) as u16,
        })
    }

    pub fn linear(&self) -> u64 {
        ((self.segment as u64) << 4) + self.offset as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid() {
        assert_eq!(MemoryLayout::default().validate(), Ok(()));
    }

    #[test]
    fn stack_ends_at_loader() {
        let layout = MemoryLayout::default();
        assert_eq!(layout.stack.end(), layout.loader.base.as_u64());
    }

    #[test]
    fn detects_overlap() {
        let mut layout = MemoryLayout::default();
        layout.stage2 = Region::new(0x0500, 0x200);
        assert_eq!(
            layout.validate(),
            Err(LayoutError::Overlap(RegionKind::Directory, RegionKind::Stage2))
        );
    }

    #[test]
    fn adjacent_regions_do_not_overlap() {
        let a = Region::new(0x1000, 0x100);
        let b = Region::new(0x1100, 0x100);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&Region::new(0x10FF, 1)));
    }

    #[test]
    fn rejects_regions_above_one_mebibyte() {
        let mut layout = MemoryLayout::default();
        layout.stage2 = Region::new(0xF_F000, 0x2000);
        assert_eq!(layout.validate(), Err(LayoutError::AboveRealMode(RegionKind::Stage2)));
    }

    #[test]
    fn oversized_region_does_not_wrap() {
        let mut layout = MemoryLayout::default();
        layout.stage2 = Region::new(0x8000, u64::MAX);
        assert_eq!(layout.validate(), Err(LayoutError::AboveRealMode(RegionKind::Stage2)));
        assert_eq!(layout.stage2.checked_end(), None);
        assert_eq!(layout.stage2.end(), u64::MAX);
    }

    #[test]
    fn rejects_empty_and_short_regions() {
        let mut layout = MemoryLayout::default();
        layout.directory.size = 0;
        assert_eq!(layout.validate(), Err(LayoutError::Empty(RegionKind::Directory)));

        let mut layout = MemoryLayout::default();
        layout.loader.size = 0x100;
        assert_eq!(layout.validate(), Err(LayoutError::LoaderTooSmall));
    }

    #[test]
    fn real_mode_pointer_normalizes() {
        let ptr = RealModePtr::from_phys(PhysAddr::new(0x0500)).unwrap();
        assert_eq!(ptr, RealModePtr { segment: 0x0050, offset: 0 });

        let ptr = RealModePtr::from_phys(PhysAddr::new(0x7C0F)).unwrap();
        assert_eq!(ptr, RealModePtr { segment: 0x07C0, offset: 0xF });
        assert_eq!(ptr.linear(), 0x7C0F);

        assert_eq!(RealModePtr::from_phys(PhysAddr::new(0x10_0000)), None);
    }
}
