//! FAT12/16 volume layout
//!
//! The first stage never walks a FAT chain; all it needs is where the root
//! directory sits and where a cluster starts. Both come straight out of the
//! boot sector.

mod boot_sector;
pub mod constants;
mod dir_entry;
pub mod format;

pub use boot_sector::{BootSector, BOOT_SECTOR_HEADER_SIZE};
pub use dir_entry::{DirEntry83, ShortName};

use constants::*;

/// Read-only view of the boot sector fields the loader depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeDescriptor {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_count: u8,
    pub sectors_per_fat: u16,
    pub root_dir_entries: u16,
    pub sectors_per_track: u16,
    pub head_count: u16,
    pub media_type: u8,
    pub drive_number: u8,
}

impl VolumeDescriptor {
    /// Starting sector of first FAT
    pub fn fat_start(&self) -> u32 {
        self.reserved_sectors as u32
    }

    /// Starting sector of the root directory, right after the FAT copies
    pub fn root_dir_start(&self) -> u32 {
        self.fat_start() + self.fat_count as u32 * self.sectors_per_fat as u32
    }

    /// Root directory size in whole sectors.
    ///
    /// Truncates like the boot code always has; a root entry count that is
    /// not a multiple of the entries per sector loses its tail.
    pub fn root_dir_sectors(&self) -> u32 {
        self.root_dir_bytes() / self.bytes_per_sector as u32
    }

    pub fn root_dir_bytes(&self) -> u32 {
        self.root_dir_entries as u32 * DIR_ENTRY_SIZE as u32
    }

    /// Starting sector of the data area (cluster 2)
    pub fn data_start(&self) -> u32 {
        self.root_dir_start() + self.root_dir_sectors()
    }

    /// Size of each cluster in bytes
    pub fn cluster_size(&self) -> usize {
        self.sectors_per_cluster as usize * self.bytes_per_sector as usize
    }

    /// First sector of `cluster`, or `None` for the reserved clusters 0 and 1
    /// and for results that do not fit 32 bits.
    pub fn cluster_to_sector(&self, cluster: u16) -> Option<u32> {
        let index = cluster.checked_sub(FIRST_DATA_CLUSTER)? as u32;
        index
            .checked_mul(self.sectors_per_cluster as u32)?
            .checked_add(self.data_start())
    }

    /// Same as `cluster_to_sector` but with the boot code's 32-bit
    /// wrap-around: cluster 0 or 1 lands before the data area instead of
    /// being rejected.
    pub fn cluster_to_sector_wrapping(&self, cluster: u16) -> u32 {
        let offset = (cluster as i32 - FIRST_DATA_CLUSTER as i32) * self.sectors_per_cluster as i32;
        self.data_start().wrapping_add(offset as u32)
    }
}
