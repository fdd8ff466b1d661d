//! First-cluster read of the second stage and the jump into it.

use super::{config::FailurePolicy, reader, BootContext};
use crate::error::BootError;
use crate::firmware::Firmware;
use crate::memory::{LayoutError, PhysMemory, RealModePtr, RegionKind};
use log::{info, warn};

/// Everything the second stage is entered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub entry: RealModePtr,
    /// Passed in DL
    pub drive: u8,
    /// Where the image was read from
    pub lba: u32,
    pub sectors: u8,
}

impl Handoff {
    pub fn execute<F: Firmware>(self, firmware: &mut F) -> ! {
        info!(
            "jumping to {:04x}:{:04x}, drive {:#04x}",
            self.entry.segment, self.entry.offset, self.drive
        );
        firmware.transfer(self.entry, self.drive)
    }
}

/// Data area LBA of `cluster`.
pub fn file_lba(ctx: &BootContext, cluster: u16) -> Result<u32, BootError> {
    match ctx.config.failure_policy {
        FailurePolicy::Halt => ctx
            .volume
            .cluster_to_sector(cluster)
            .ok_or(BootError::ReservedCluster(cluster)),
        FailurePolicy::Ignore => {
            if cluster < 2 {
                warn!("entry starts at reserved cluster {}", cluster);
            }
            Ok(ctx.volume.cluster_to_sector_wrapping(cluster))
        }
    }
}

/// Reads the configured number of sectors from `lba` into the stage 2
/// region.
pub fn load_stage2<F: Firmware, M: PhysMemory>(
    ctx: &mut BootContext,
    firmware: &mut F,
    memory: &mut M,
    lba: u32,
) -> Result<Handoff, BootError> {
    let region = ctx.layout.stage2;
    let entry = RealModePtr::from_phys(region.base)
        .ok_or(BootError::Layout(LayoutError::AboveRealMode(RegionKind::Stage2)))?;
    let dest = memory.region_mut(region).ok_or(BootError::Unmapped(region))?;
    let sectors = ctx.config.stage2_sectors;

    reader::read_sectors(ctx, firmware, dest, lba, sectors)?;

    Ok(Handoff {
        entry,
        drive: ctx.drive,
        lba,
        sectors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesys::fat16::constants::SECTOR_SIZE;
    use crate::firmware::disk_image::DiskImage;
    use crate::loader::config::LoaderConfig;
    use crate::loader::tests::{context, FLOPPY};
    use crate::memory::{BufferMemory, Region};
    use std::vec;
    use std::vec::Vec;
    use x86_64::PhysAddr;

    #[test]
    fn cluster_two_is_first_data_sector() {
        let ctx = context(FLOPPY, LoaderConfig::default());
        assert_eq!(file_lba(&ctx, 2), Ok(33));
        assert_eq!(file_lba(&ctx, 5), Ok(45));
    }

    #[test]
    fn reserved_cluster_depends_on_policy() {
        let ctx = context(FLOPPY, LoaderConfig::default());
        assert_eq!(file_lba(&ctx, 0), Err(BootError::ReservedCluster(0)));

        let ctx = context(FLOPPY, LoaderConfig::legacy());
        assert_eq!(file_lba(&ctx, 1), Ok(29));
    }

    #[test]
    fn loads_into_stage2_region() {
        let image: Vec<u8> = (0..72u8).flat_map(|n| [n; SECTOR_SIZE]).collect();
        let mut disk = DiskImage::new(&image, 0, 2, 18);
        let mut ctx = context(FLOPPY, LoaderConfig::default());
        ctx.layout.stage2 = Region::new(0x8000, 4 * SECTOR_SIZE as u64);
        ctx.device.heads = 2;
        ctx.device.sectors_per_track = 18;

        let mut backing = vec![0u8; 4 * SECTOR_SIZE];
        let mut memory = BufferMemory::new(PhysAddr::new(0x8000), &mut backing);
        let handoff = load_stage2(&mut ctx, &mut disk, &mut memory, 45).unwrap();

        assert_eq!(handoff.entry, RealModePtr { segment: 0x0800, offset: 0 });
        assert_eq!(handoff.drive, 0);
        assert_eq!(handoff.sectors, 3);
        assert_eq!(ctx.device.lba, 45);
        assert_eq!(backing[0], 45);
        assert_eq!(backing[2 * SECTOR_SIZE], 47);
        assert_eq!(backing[3 * SECTOR_SIZE], 0);
    }

    #[test]
    fn unmapped_stage2_region() {
        let image = [0u8; SECTOR_SIZE];
        let mut disk = DiskImage::new(&image, 0, 2, 18);
        let mut ctx = context(FLOPPY, LoaderConfig::default());
        let mut backing = [0u8; 16];
        let mut memory = BufferMemory::new(PhysAddr::new(0x8000), &mut backing);

        assert_eq!(
            load_stage2(&mut ctx, &mut disk, &mut memory, 33),
            Err(BootError::Unmapped(ctx.layout.stage2))
        );
    }

    #[test]
    #[should_panic(expected = "0800:0000")]
    fn execute_transfers_control() {
        let image = [0u8; SECTOR_SIZE];
        let mut disk = DiskImage::new(&image, 0, 2, 18);
        let handoff = Handoff {
            entry: RealModePtr { segment: 0x0800, offset: 0 },
            drive: 0,
            lba: 33,
            sectors: 3,
        };
        handoff.execute(&mut disk);
    }
}
