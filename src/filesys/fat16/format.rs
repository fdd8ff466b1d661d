//! Volume creation for disk images held in memory.
//!
//! Produces the layout the first stage expects: one boot sector, FAT
//! copies, a fixed root directory and the cluster area. Files are stored
//! in contiguous clusters so the loader's first-cluster read covers them.

use super::{constants::*, BootSector, DirEntry83, ShortName, VolumeDescriptor, BOOT_SECTOR_HEADER_SIZE};
use crate::filesys::FsError;

/// Clusters below this count make a FAT12 volume.
const FAT12_CLUSTER_LIMIT: u32 = 4085;

const FAT12_END_OF_CHAIN: u16 = 0x0FFF;
const FAT16_END_OF_CHAIN: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatKind {
    Fat12,
    Fat16,
}

impl FatKind {
    fn for_clusters(clusters: u32) -> Self {
        if clusters < FAT12_CLUSTER_LIMIT {
            FatKind::Fat12
        } else {
            FatKind::Fat16
        }
    }

    fn fs_type(self) -> [u8; 8] {
        match self {
            FatKind::Fat12 => *b"FAT12   ",
            FatKind::Fat16 => *b"FAT16   ",
        }
    }

    fn end_of_chain(self) -> u16 {
        match self {
            FatKind::Fat12 => FAT12_END_OF_CHAIN,
            FatKind::Fat16 => FAT16_END_OF_CHAIN,
        }
    }

    /// Bytes needed for `entries` FAT entries.
    fn table_bytes(self, entries: u32) -> u32 {
        match self {
            FatKind::Fat12 => (entries * 3).div_ceil(2),
            FatKind::Fat16 => entries * 2,
        }
    }
}

/// Parameters for `format`. The sector count comes from the image size.
#[derive(Debug, Clone, Copy)]
pub struct FormatParams {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_count: u8,
    pub root_dir_entries: u16,
    /// Computed from the cluster count when `None`.
    pub sectors_per_fat: Option<u16>,
    pub sectors_per_track: u16,
    pub head_count: u16,
    pub media_type: u8,
    pub drive_number: u8,
    pub volume_label: [u8; 11],
}

impl FormatParams {
    /// 1.44 MB floppy: 80 cylinders, 2 heads, 18 sectors per track.
    pub fn floppy_1440() -> Self {
        Self {
            bytes_per_sector: SECTOR_SIZE as u16,
            sectors_per_cluster: 1,
            reserved_sectors: 1,
            fat_count: 2,
            root_dir_entries: 224,
            sectors_per_fat: Some(9),
            sectors_per_track: 18,
            head_count: 2,
            media_type: MEDIA_FLOPPY_1440,
            drive_number: 0x00,
            volume_label: *b"NO NAME    ",
        }
    }

    /// Small fixed disk with the usual 63 sectors / 16 heads translation.
    pub fn fixed_disk() -> Self {
        Self {
            bytes_per_sector: SECTOR_SIZE as u16,
            sectors_per_cluster: 4, // Typically 4 for small drives
            reserved_sectors: 1,
            fat_count: 2,
            root_dir_entries: 512,
            sectors_per_fat: None,
            sectors_per_track: 63,
            head_count: 16,
            media_type: MEDIA_FIXED_DISK,
            drive_number: 0x80,
            volume_label: *b"NO NAME    ",
        }
    }
}

/// Writes an empty volume over `image` and returns its descriptor.
pub fn format(image: &mut [u8], params: &FormatParams) -> Result<VolumeDescriptor, FsError> {
    let block_size = params.bytes_per_sector as usize;
    if block_size < SECTOR_SIZE || block_size % DIR_ENTRY_SIZE != 0 || params.sectors_per_cluster == 0 {
        return Err(FsError::InvalidBpb);
    }

    let total_sectors = (image.len() / block_size) as u32;
    // Whole sectors only, so the truncating root size the loader computes
    // covers every entry
    let entries_per_sector = (block_size / DIR_ENTRY_SIZE) as u32;
    let root_dir_sectors = (params.root_dir_entries as u32).div_ceil(entries_per_sector);
    let root_dir_entries =
        u16::try_from(root_dir_sectors * entries_per_sector).map_err(|_| FsError::InvalidBpb)?;
    let overhead = params.reserved_sectors as u32 + root_dir_sectors;
    if total_sectors <= overhead {
        return Err(FsError::NoSpace);
    }

    // Calculate sectors per FAT
    let rough_clusters = (total_sectors - overhead) / params.sectors_per_cluster as u32;
    let kind = FatKind::for_clusters(rough_clusters);
    let sectors_per_fat = match params.sectors_per_fat {
        Some(sectors) => sectors,
        None => kind.table_bytes(rough_clusters + 2).div_ceil(block_size as u32) as u16,
    };

    let data_start = overhead + params.fat_count as u32 * sectors_per_fat as u32;
    if total_sectors <= data_start {
        return Err(FsError::NoSpace);
    }

    let boot_sector = BootSector {
        jump_boot: [0xEB, 0x3C, 0x90], // Standard boot jump
        oem_name: *b"FATBOOT ",
        bytes_per_sector: params.bytes_per_sector,
        sectors_per_cluster: params.sectors_per_cluster,
        reserved_sectors: params.reserved_sectors,
        fat_count: params.fat_count,
        root_dir_entries,
        total_sectors_16: if total_sectors < 65536 {
            total_sectors as u16
        } else {
            0
        },
        media_type: params.media_type,
        sectors_per_fat,
        sectors_per_track: params.sectors_per_track,
        head_count: params.head_count,
        hidden_sectors: 0,
        total_sectors_32: if total_sectors >= 65536 { total_sectors } else { 0 },
        drive_number: params.drive_number,
        reserved1: 0,
        boot_signature: EXTENDED_BOOT_SIGNATURE,
        volume_id: 0x1983_0A55,
        volume_label: params.volume_label,
        fs_type: kind.fs_type(),
    };

    image.fill(0);
    boot_sector.write_to(&mut image[..block_size])?;
    let volume = boot_sector.descriptor();

    // First two FAT entries are reserved: media byte, then end-of-chain
    for copy in 0..volume.fat_count as u32 {
        let fat_start = (volume.fat_start() + copy * sectors_per_fat as u32) as usize * block_size;
        let fat = &mut image[fat_start..fat_start + block_size];
        fat[0] = params.media_type;
        fat[1] = 0xFF;
        fat[2] = 0xFF;
        if kind == FatKind::Fat16 {
            fat[3] = 0xFF;
        }
    }

    Ok(volume)
}

/// Stores `contents` as a root directory file and returns its first cluster
/// (0 for an empty file).
pub fn add_file(image: &mut [u8], name: ShortName, contents: &[u8]) -> Result<u16, FsError> {
    let volume = BootSector::from_sector(image)?.descriptor();
    let kind = fat_kind(image, &volume)?;

    let cluster_size = volume.cluster_size();
    let needed = contents.len().div_ceil(cluster_size) as u32;
    let file_size = u32::try_from(contents.len()).map_err(|_| FsError::NoSpace)?;

    let start_cluster = if needed == 0 {
        0
    } else {
        let start = find_free_run(image, &volume, kind, needed)?;
        for offset in 0..needed {
            let cluster = start + offset as u16;
            let next = if offset + 1 == needed {
                kind.end_of_chain()
            } else {
                cluster + 1
            };
            write_fat_entry(image, &volume, kind, cluster, next)?;
        }

        let first_sector = volume.cluster_to_sector(start).ok_or(FsError::NoSpace)? as usize;
        let data_offset = first_sector * volume.bytes_per_sector as usize;
        image
            .get_mut(data_offset..data_offset + contents.len())
            .ok_or(FsError::NoSpace)?
            .copy_from_slice(contents);
        start
    };

    add_entry(image, &DirEntry83::new_file(name, start_cluster, file_size))?;
    Ok(start_cluster)
}

/// Writes `entry` into the first free or deleted root directory slot and
/// returns the slot index. Does not touch the FAT.
pub fn add_entry(image: &mut [u8], entry: &DirEntry83) -> Result<usize, FsError> {
    let volume = BootSector::from_sector(image)?.descriptor();
    let start = volume.root_dir_start() as usize * volume.bytes_per_sector as usize;
    let end = start + volume.root_dir_bytes() as usize;
    let root = image.get_mut(start..end).ok_or(FsError::InvalidLength)?;

    for (index, slot) in root.chunks_exact_mut(DIR_ENTRY_SIZE).enumerate() {
        let existing = DirEntry83::from_bytes(slot)?;
        if existing.is_free() || existing.is_deleted() {
            entry.write_to(slot)?;
            return Ok(index);
        }
    }

    // Root directory is fixed size on FAT12/16
    Err(FsError::NoSpace)
}

/// Copies a linked first-stage binary into sector 0 of a formatted image.
///
/// The jump at offset 0 and the code after the parameter block come from
/// `loader`; the parameter block itself stays as `format` wrote it.
pub fn install_boot_code(image: &mut [u8], loader: &[u8]) -> Result<(), FsError> {
    if loader.len() < SECTOR_SIZE || image.len() < SECTOR_SIZE {
        return Err(FsError::InvalidLength);
    }
    if loader[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 2] != BOOT_SIGNATURE {
        return Err(FsError::InvalidSignature);
    }
    BootSector::from_sector(image)?;

    image[..3].copy_from_slice(&loader[..3]);
    image[BOOT_SECTOR_HEADER_SIZE..SIGNATURE_OFFSET]
        .copy_from_slice(&loader[BOOT_SECTOR_HEADER_SIZE..SIGNATURE_OFFSET]);
    Ok(())
}

fn fat_kind(image: &[u8], volume: &VolumeDescriptor) -> Result<FatKind, FsError> {
    let boot_sector = BootSector::from_sector(image)?;
    let total_sectors = match boot_sector.total_sectors_16 {
        0 => boot_sector.total_sectors_32,
        sectors => sectors as u32,
    };
    let clusters = total_sectors.saturating_sub(volume.data_start()) / volume.sectors_per_cluster as u32;
    Ok(FatKind::for_clusters(clusters))
}

fn total_clusters(image: &[u8], volume: &VolumeDescriptor) -> u32 {
    let sectors = (image.len() / volume.bytes_per_sector as usize) as u32;
    sectors.saturating_sub(volume.data_start()) / volume.sectors_per_cluster as u32
}

fn find_free_run(image: &[u8], volume: &VolumeDescriptor, kind: FatKind, needed: u32) -> Result<u16, FsError> {
    let last = total_clusters(image, volume) + FIRST_DATA_CLUSTER as u32;
    let mut run_start = FIRST_DATA_CLUSTER as u32;
    let mut run_length = 0;

    for cluster in FIRST_DATA_CLUSTER as u32..last {
        if read_fat_entry(image, volume, kind, cluster as u16)? == 0 {
            if run_length == 0 {
                run_start = cluster;
            }
            run_length += 1;
            if run_length == needed {
                return u16::try_from(run_start).map_err(|_| FsError::NoSpace);
            }
        } else {
            run_length = 0;
        }
    }

    // No free clusters
    Err(FsError::NoSpace)
}

fn fat_entry_location(volume: &VolumeDescriptor, kind: FatKind, cluster: u16) -> usize {
    let fat_start = volume.fat_start() as usize * volume.bytes_per_sector as usize;
    match kind {
        FatKind::Fat12 => fat_start + cluster as usize + cluster as usize / 2,
        FatKind::Fat16 => fat_start + cluster as usize * 2,
    }
}

fn read_fat_entry(image: &[u8], volume: &VolumeDescriptor, kind: FatKind, cluster: u16) -> Result<u16, FsError> {
    let offset = fat_entry_location(volume, kind, cluster);
    let bytes = image.get(offset..offset + 2).ok_or(FsError::InvalidLength)?;
    let raw = u16::from_le_bytes([bytes[0], bytes[1]]);

    Ok(match kind {
        FatKind::Fat12 if cluster % 2 == 1 => raw >> 4,
        FatKind::Fat12 => raw & 0x0FFF,
        FatKind::Fat16 => raw,
    })
}

fn write_fat_entry(
    image: &mut [u8],
    volume: &VolumeDescriptor,
    kind: FatKind,
    cluster: u16,
    value: u16,
) -> Result<(), FsError> {
    let table_bytes = volume.sectors_per_fat as usize * volume.bytes_per_sector as usize;
    let offset = fat_entry_location(volume, kind, cluster);

    // Write to every FAT copy
    for copy in 0..volume.fat_count as usize {
        let at = offset + copy * table_bytes;
        let bytes = image.get_mut(at..at + 2).ok_or(FsError::InvalidLength)?;
        let raw = u16::from_le_bytes([bytes[0], bytes[1]]);
        let updated = match kind {
            FatKind::Fat12 if cluster % 2 == 1 => (raw & 0x000F) | (value << 4),
            FatKind::Fat12 => (raw & 0xF000) | (value & 0x0FFF),
            FatKind::Fat16 => value,
        };
        bytes.copy_from_slice(&updated.to_le_bytes());
    }
    Ok(())
}
