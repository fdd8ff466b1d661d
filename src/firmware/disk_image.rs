//! Disk services backed by an in-memory disk image

use super::{ChsAddress, DriveParameters, Firmware, FirmwareError, ReadRequest};
use crate::filesys::fat16::constants::SECTOR_SIZE;
use crate::memory::RealModePtr;
use arrayvec::ArrayVec;

/// Number of read requests remembered for inspection
pub const REQUEST_LOG_CAPACITY: usize = 16;

/// Firmware stand-in that serves one drive from a byte image using a fixed
/// CHS geometry, the way a BIOS serves a floppy or a translated hard disk.
pub struct DiskImage<'a> {
    /// Whole disk, a multiple of SECTOR_SIZE bytes
    image: &'a [u8],

    /// Drive number the image answers to
    drive: u8,

    /// Geometry reported by AH=08h and used to decode CHS reads
    geometry: DriveParameters,

    /// Status returned by AH=08h instead of succeeding
    probe_failure: Option<FirmwareError>,

    /// Status returned by AH=02h instead of succeeding, after
    /// `reads_before_failure` good reads
    read_failure: Option<FirmwareError>,
    reads_before_failure: usize,

    /// Requests seen so far, oldest first
    requests: ArrayVec<ReadRequest, REQUEST_LOG_CAPACITY>,
}

impl<'a> DiskImage<'a> {
    /// Creates a drive over `image` with `heads` heads and
    /// `sectors_per_track` sectors per track.
    pub fn new(image: &'a [u8], drive: u8, heads: u16, sectors_per_track: u8) -> Self {
        let sectors = (image.len() / SECTOR_SIZE) as u32;
        let per_cylinder = (heads.max(1) as u32) * (sectors_per_track.max(1) as u32);
        let cylinders = sectors.div_ceil(per_cylinder).max(1);

        Self {
            image,
            drive,
            geometry: DriveParameters {
                sectors_per_track,
                max_head: heads.saturating_sub(1) as u8,
                max_cylinder: (cylinders - 1).min(1023) as u16,
            },
            probe_failure: None,
            read_failure: None,
            reads_before_failure: 0,
            requests: ArrayVec::new(),
        }
    }

    /// Makes every AH=08h call fail with `error`.
    pub fn fail_probe(mut self, error: FirmwareError) -> Self {
        self.probe_failure = Some(error);
        self
    }

    /// Lets `after` reads succeed, then fails every later one with `error`.
    pub fn fail_reads(mut self, after: usize, error: FirmwareError) -> Self {
        self.read_failure = Some(error);
        self.reads_before_failure = after;
        self
    }

    /// Read requests received, oldest first. Stops recording once full.
    pub fn requests(&self) -> &[ReadRequest] {
        &self.requests
    }

    /// Total number of sectors
    pub fn total_sectors(&self) -> u64 {
        (self.image.len() / SECTOR_SIZE) as u64
    }

    /// Decodes a CHS address against the image geometry
    fn chs_to_lba(&self, chs: ChsAddress) -> Result<u64, FirmwareError> {
        let spt = self.geometry.sectors_per_track as u64;
        let heads = self.geometry.head_count() as u64;
        let sector = chs.sector() as u64;

        if sector == 0 || sector > spt || chs.head() as u64 >= heads {
            return Err(FirmwareError::SECTOR_NOT_FOUND);
        }
        Ok((chs.cylinder() as u64 * heads + chs.head() as u64) * spt + sector - 1)
    }
}

impl Firmware for DiskImage<'_> {
    fn drive_parameters(&mut self, drive: u8) -> Result<DriveParameters, FirmwareError> {
        if drive != self.drive {
            return Err(FirmwareError::INVALID_COMMAND);
        }
        match self.probe_failure {
            Some(error) => Err(error),
            None => Ok(self.geometry),
        }
    }

    fn read_sectors(&mut self, request: &ReadRequest, dest: &mut [u8]) -> Result<(), FirmwareError> {
        let _ = self.requests.try_push(*request);

        if request.drive != self.drive {
            return Err(FirmwareError::INVALID_COMMAND);
        }
        if let Some(error) = self.read_failure {
            if self.reads_before_failure == 0 {
                return Err(error);
            }
            self.reads_before_failure -= 1;
        }

        let lba = self.chs_to_lba(request.chs)?;
        let count = request.count as u64;
        if lba + count > self.total_sectors() {
            return Err(FirmwareError::SECTOR_NOT_FOUND);
        }

        let start = lba as usize * SECTOR_SIZE;
        let len = count as usize * SECTOR_SIZE;
        let target = dest.get_mut(..len).ok_or(FirmwareError::INVALID_COMMAND)?;
        target.copy_from_slice(&self.image[start..start + len]);
        Ok(())
    }

    fn transfer(&mut self, entry: RealModePtr, drive: u8) -> ! {
        panic!(
            "disk image cannot execute stage 2 at {:04x}:{:04x} (drive {:#04x})",
            entry.segment, entry.offset, drive
        );
    }

    fn halt(&mut self) -> ! {
        panic!("disk image halted");
    }
}
