//! FAT12/16 Boot Sector Structure

use super::{constants::*, VolumeDescriptor};
use crate::filesys::FsError;

/// BIOS parameter block and extended boot record at the start of the
/// boot sector. The loader's own code follows at offset 62.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct BootSector {
    /// Jump instruction to boot code
    pub jump_boot: [u8; 3],

    /// Name of the system that formatted the volume
    pub oem_name: [u8; 8],

    /// Number of bytes per sector
    pub bytes_per_sector: u16,

    /// Number of sectors per cluster
    pub sectors_per_cluster: u8,

    /// Number of reserved sectors at start of volume
    /// Including the boot sector. Typically 1 for FAT12/16
    pub reserved_sectors: u16,

    /// Number of FAT copies
    pub fat_count: u8,

    /// Maximum number of root directory entries
    pub root_dir_entries: u16,

    /// Total number of sectors (16-bit)
    /// Used if volume is smaller than 32MB, otherwise use total_sectors_32
    pub total_sectors_16: u16,

    /// Media type descriptor
    pub media_type: u8,

    /// Sectors per FAT
    /// Size of each FAT copy in sectors
    pub sectors_per_fat: u16,

    /// Sectors per track for interrupt 0x13
    pub sectors_per_track: u16,

    /// Number of heads for interrupt 0x13
    pub head_count: u16,

    /// Number of hidden sectors preceding the partition
    pub hidden_sectors: u32,

    /// Total number of sectors (32-bit)
    pub total_sectors_32: u32,

    /// INT 13h drive number
    pub drive_number: u8,

    /// Reserved byte
    pub reserved1: u8,

    /// Extended boot signature
    pub boot_signature: u8,

    /// Volume serial number
    pub volume_id: u32,

    /// Volume label
    pub volume_label: [u8; 11],

    /// Filesystem type string
    pub fs_type: [u8; 8],
}

/// Size of the parameter block; boot code starts right after it.
pub const BOOT_SECTOR_HEADER_SIZE: usize = core::mem::size_of::<BootSector>();

impl BootSector {
    /// Reads the parameter block out of a raw boot sector.
    ///
    /// Checks the 0x55 0xAA trailer and the two fields every later address
    /// computation divides or multiplies by.
    pub fn from_sector(sector: &[u8]) -> Result<Self, FsError> {
        if sector.len() < SECTOR_SIZE {
            return Err(FsError::InvalidLength);
        }
        if sector[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 2] != BOOT_SIGNATURE {
            return Err(FsError::InvalidSignature);
        }

        let boot_sector = unsafe { core::ptr::read_unaligned(sector.as_ptr() as *const BootSector) };

        let bytes_per_sector = boot_sector.bytes_per_sector;
        if bytes_per_sector == 0 || bytes_per_sector as usize % DIR_ENTRY_SIZE != 0 {
            return Err(FsError::InvalidBpb);
        }
        if boot_sector.sectors_per_cluster == 0 {
            return Err(FsError::InvalidBpb);
        }

        Ok(boot_sector)
    }

    /// Serializes the parameter block into the first bytes of `sector` and
    /// stamps the trailer. Boot code bytes in between are left untouched.
    pub fn write_to(&self, sector: &mut [u8]) -> Result<(), FsError> {
        if sector.len() < SECTOR_SIZE {
            return Err(FsError::InvalidLength);
        }

        let bytes = unsafe {
            core::slice::from_raw_parts(self as *const BootSector as *const u8, BOOT_SECTOR_HEADER_SIZE)
        };
        sector[..BOOT_SECTOR_HEADER_SIZE].copy_from_slice(bytes);
        sector[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 2].copy_from_slice(&BOOT_SIGNATURE);
        Ok(())
    }

    /// The subset of the parameter block the loader works from.
    pub fn descriptor(&self) -> VolumeDescriptor {
        VolumeDescriptor {
            bytes_per_sector: self.bytes_per_sector,
            sectors_per_cluster: self.sectors_per_cluster,
            reserved_sectors: self.reserved_sectors,
            fat_count: self.fat_count,
            sectors_per_fat: self.sectors_per_fat,
            root_dir_entries: self.root_dir_entries,
            sectors_per_track: self.sectors_per_track,
            head_count: self.head_count,
            media_type: self.media_type,
            drive_number: self.drive_number,
        }
    }
}
