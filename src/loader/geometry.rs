//! Drive geometry probe (INT 13h AH=08h).

use super::{config::*, BootContext};
use crate::error::BootError;
use crate::firmware::{DriveParameters, Firmware};
use log::{debug, warn};

/// Fills in sectors-per-track and the head count of the device state.
///
/// With `FailurePolicy::Ignore` a failed call is not checked: the device
/// state gets the untouched register contents, modelled as all zero, and
/// the first CHS translation then fails with `InvalidGeometry`.
pub fn probe<F: Firmware>(ctx: &mut BootContext, firmware: &mut F) -> Result<(), BootError> {
    let params = match firmware.drive_parameters(ctx.drive) {
        Ok(params) => params,
        Err(error) => match ctx.config.failure_policy {
            FailurePolicy::Halt => return Err(BootError::GeometryProbe(error)),
            FailurePolicy::Ignore => {
                warn!("drive {:#04x}: {} (ignored)", ctx.drive, error);
                DriveParameters::UNSET
            }
        },
    };

    ctx.device.sectors_per_track = params.sectors_per_track as u16;
    ctx.device.heads = match ctx.config.head_source {
        HeadSource::VolumeDescriptor => ctx.volume.head_count,
        HeadSource::Probe => params.head_count(),
    };

    debug!(
        "drive {:#04x}: {} sectors/track, {} heads",
        ctx.drive, ctx.device.sectors_per_track, ctx.device.heads
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::disk_image::DiskImage;
    use crate::firmware::FirmwareError;
    use crate::loader::tests::{context, FLOPPY};

    #[test]
    fn takes_sectors_from_firmware_and_heads_from_volume() {
        let image = [0u8; 512];
        let mut disk = DiskImage::new(&image, 0, 16, 63);
        let mut ctx = context(FLOPPY, LoaderConfig::default());

        probe(&mut ctx, &mut disk).unwrap();
        assert_eq!(ctx.device.sectors_per_track, 63);
        assert_eq!(ctx.device.heads, 2);
    }

    #[test]
    fn probed_heads_are_max_index_plus_one() {
        let image = [0u8; 512];
        let mut disk = DiskImage::new(&image, 0, 16, 63);
        let mut ctx = context(FLOPPY, LoaderConfig::trunk());

        probe(&mut ctx, &mut disk).unwrap();
        assert_eq!(ctx.device.heads, 16);
    }

    #[test]
    fn failure_halts_when_checked() {
        let image = [0u8; 512];
        let mut disk = DiskImage::new(&image, 0, 2, 18).fail_probe(FirmwareError::DRIVE_NOT_READY);
        let mut ctx = context(FLOPPY, LoaderConfig::default());

        assert_eq!(
            probe(&mut ctx, &mut disk),
            Err(BootError::GeometryProbe(FirmwareError::DRIVE_NOT_READY))
        );
    }

    #[test]
    fn failure_leaves_unset_geometry_when_ignored() {
        let image = [0u8; 512];
        let mut disk = DiskImage::new(&image, 0, 2, 18).fail_probe(FirmwareError::DRIVE_NOT_READY);
        let mut ctx = context(FLOPPY, LoaderConfig::legacy());

        assert_eq!(probe(&mut ctx, &mut disk), Ok(()));
        assert_eq!(ctx.device.sectors_per_track, 0);
    }
}
