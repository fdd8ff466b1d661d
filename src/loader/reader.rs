//! LBA to CHS translation and sector reads (INT 13h AH=02h).

use super::{config::FailurePolicy, BootContext};
use crate::constants::bios::{MAX_CYLINDER, MAX_HEAD, MAX_SECTOR};
use crate::error::BootError;
use crate::firmware::{ChsAddress, Firmware, ReadRequest};
use log::{trace, warn};

/// Unpacked CHS coordinates. Sector is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chs {
    pub cylinder: u32,
    pub head: u32,
    pub sector: u32,
}

impl Chs {
    /// `None` when either divisor is zero.
    pub fn from_lba(lba: u32, heads: u16, sectors_per_track: u16) -> Option<Self> {
        if heads == 0 || sectors_per_track == 0 {
            return None;
        }

        let sectors_per_track = sectors_per_track as u32;
        let sectors_per_cylinder = heads as u32 * sectors_per_track;
        let within_cylinder = lba % sectors_per_cylinder;

        Some(Self {
            cylinder: lba / sectors_per_cylinder,
            head: within_cylinder / sectors_per_track,
            sector: within_cylinder % sectors_per_track + 1,
        })
    }

    pub fn to_lba(&self, heads: u16, sectors_per_track: u16) -> u64 {
        (self.cylinder as u64 * heads as u64 + self.head as u64) * sectors_per_track as u64 + self.sector as u64
            - 1
    }

    /// Register form, or `None` if a coordinate does not fit its field.
    pub fn pack(&self) -> Option<ChsAddress> {
        if self.cylinder > MAX_CYLINDER || self.head > MAX_HEAD || self.sector > MAX_SECTOR {
            return None;
        }
        Some(self.pack_truncating())
    }

    /// Register form with the excess bits dropped, which reads some other
    /// sector than the one asked for.
    pub fn pack_truncating(&self) -> ChsAddress {
        ChsAddress::new(self.cylinder as u16, self.head as u8, self.sector as u8)
    }
}

/// Narrows a sector count to the 8-bit AL field.
pub fn sector_count(ctx: &BootContext, sectors: u32, lba: u32) -> Result<u8, BootError> {
    match u8::try_from(sectors) {
        Ok(count) => Ok(count),
        Err(_) => match ctx.config.failure_policy {
            FailurePolicy::Halt => Err(BootError::AddressOutOfRange { lba }),
            FailurePolicy::Ignore => {
                warn!("{} sectors at LBA {} truncated to {}", sectors, lba, sectors as u8);
                Ok(sectors as u8)
            }
        },
    }
}

/// Reads `count` sectors starting at `lba` into the front of `dest`.
///
/// Records `lba` in the device state first. No retry: with
/// `FailurePolicy::Ignore` a failed read returns `Ok` and `dest` keeps
/// whatever the firmware left in it.
pub fn read_sectors<F: Firmware>(
    ctx: &mut BootContext,
    firmware: &mut F,
    dest: &mut [u8],
    lba: u32,
    count: u8,
) -> Result<(), BootError> {
    ctx.device.lba = lba;

    let chs = Chs::from_lba(lba, ctx.device.heads, ctx.device.sectors_per_track)
        .ok_or(BootError::InvalidGeometry)?;
    let address = match chs.pack() {
        Some(address) => address,
        None if ctx.config.failure_policy == FailurePolicy::Halt => {
            return Err(BootError::AddressOutOfRange { lba });
        }
        None => {
            warn!("LBA {} is {:?}, truncating", lba, chs);
            chs.pack_truncating()
        }
    };

    let needed = count as usize * ctx.volume.bytes_per_sector as usize;
    let available = dest.len();
    let dest = dest
        .get_mut(..needed)
        .ok_or(BootError::BufferTooSmall { needed, available })?;

    let request = ReadRequest {
        drive: ctx.drive,
        chs: address,
        count,
    };
    trace!(
        "read LBA {} -> C{}/H{}/S{} x{}",
        lba,
        address.cylinder(),
        address.head(),
        address.sector(),
        count
    );

    if let Err(error) = firmware.read_sectors(&request, dest) {
        match ctx.config.failure_policy {
            FailurePolicy::Halt => return Err(BootError::SectorRead { lba, error }),
            FailurePolicy::Ignore => warn!("read at LBA {} failed: {} (ignored)", lba, error),
        }
    }
    Ok(())
}
