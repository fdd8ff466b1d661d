//! Terminal failures of the first stage.
//!
//! None of these are retried. Each one ends the boot with a log line and a
//! halt; the only way forward is a different disk.

use crate::filesys::FsError;
use crate::firmware::FirmwareError;
use crate::memory::{LayoutError, Region};
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// Boot sector unreadable as a FAT12/16 parameter block
    Volume(FsError),
    Layout(LayoutError),
    /// A region the layout names is not backed by memory
    Unmapped(Region),
    GeometryProbe(FirmwareError),
    /// Zero heads or sectors per track; CHS translation is impossible
    InvalidGeometry,
    /// LBA whose CHS form does not fit the INT 13h register fields, or a
    /// sector count above 255
    AddressOutOfRange { lba: u32 },
    SectorRead { lba: u32, error: FirmwareError },
    BufferTooSmall { needed: usize, available: usize },
    FileNotFound,
    /// Directory entry pointing at cluster 0 or 1
    ReservedCluster(u16),
}

impl From<FsError> for BootError {
    fn from(error: FsError) -> Self {
        BootError::Volume(error)
    }
}

impl From<LayoutError> for BootError {
    fn from(error: LayoutError) -> Self {
        BootError::Layout(error)
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::Volume(error) => write!(f, "bad boot sector: {}", error),
            BootError::Layout(error) => write!(f, "bad memory layout: {}", error),
            BootError::Unmapped(region) => write!(
                f,
                "region {:#x}..{:#x} is not mapped",
                region.base.as_u64(),
                region.end()
            ),
            BootError::GeometryProbe(error) => write!(f, "geometry probe failed: {}", error),
            BootError::InvalidGeometry => write!(f, "drive geometry has zero heads or sectors"),
            BootError::AddressOutOfRange { lba } => write!(f, "LBA {} not addressable by CHS", lba),
            BootError::SectorRead { lba, error } => write!(f, "read at LBA {} failed: {}", lba, error),
            BootError::BufferTooSmall { needed, available } => {
                write!(f, "buffer holds {} bytes, read needs {}", available, needed)
            }
            BootError::FileNotFound => write!(f, "stage 2 not found in root directory"),
            BootError::ReservedCluster(cluster) => write!(f, "entry starts at reserved cluster {}", cluster),
        }
    }
}
