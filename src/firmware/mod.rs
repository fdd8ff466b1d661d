//! Firmware disk services and control transfer.
//!
//! The loader only ever needs two INT 13h calls, a far jump and a halt.
//! `Firmware` is the seam between the loader and whatever provides them:
//! the real BIOS on hardware, or a disk image when running hosted.

#[cfg(all(feature = "bios", target_arch = "x86"))]
pub mod bios;
pub mod disk_image;

use crate::constants::bios::*;
use crate::memory::RealModePtr;
use core::fmt;

/// Non-zero AH status returned by a failed disk service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareError {
    pub status: u8,
}

impl FirmwareError {
    pub const INVALID_COMMAND: Self = Self { status: 0x01 };
    pub const SECTOR_NOT_FOUND: Self = Self { status: 0x04 };
    pub const DRIVE_NOT_READY: Self = Self { status: 0xAA };
}

impl fmt::Display for FirmwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "disk service status {:#04x}", self.status)
    }
}

/// Result of "get drive parameters" (AH=08h), as the registers report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveParameters {
    pub sectors_per_track: u8,
    /// Highest head index, so the head count is one more
    pub max_head: u8,
    pub max_cylinder: u16,
}

impl DriveParameters {
    /// Contents of the registers before the call ever completed.
    pub const UNSET: Self = Self {
        sectors_per_track: 0,
        max_head: 0,
        max_cylinder: 0,
    };

    /// Decodes CX and DX after INT 13h AH=08h.
    pub fn from_registers(cx: u16, dx: u16) -> Self {
        Self {
            sectors_per_track: (cx & SECTOR_MASK) as u8,
            max_head: (dx >> 8) as u8,
            max_cylinder: (cx >> 8) | ((cx & 0x00C0) << 2),
        }
    }

    pub fn head_count(&self) -> u16 {
        self.max_head as u16 + 1
    }
}

/// Cylinder, head and sector packed the way INT 13h AH=02h takes them:
/// CH = cylinder bits 0-7, CL = sector (bits 0-5) | cylinder bits 8-9
/// (bits 6-7), DH = head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChsAddress {
    cx: u16,
    head: u8,
}

impl ChsAddress {
    /// Packs the coordinates; bits that do not fit their field are dropped.
    pub fn new(cylinder: u16, head: u8, sector: u8) -> Self {
        let cylinder = cylinder & 0x03FF;
        let cx = ((cylinder & 0x00FF) << 8) | ((cylinder & CYLINDER_HIGH_MASK) >> 2) | (sector as u16 & SECTOR_MASK);
        Self { cx, head }
    }

    pub fn cx(&self) -> u16 {
        self.cx
    }

    pub fn cylinder(&self) -> u16 {
        (self.cx >> 8) | ((self.cx & 0x00C0) << 2)
    }

    pub fn head(&self) -> u8 {
        self.head
    }

    /// 1-based
    pub fn sector(&self) -> u8 {
        (self.cx & SECTOR_MASK) as u8
    }
}

/// One "read sectors" call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub drive: u8,
    pub chs: ChsAddress,
    pub count: u8,
}

impl ReadRequest {
    pub fn ax(&self) -> u16 {
        ((READ_SECTORS as u16) << 8) | self.count as u16
    }

    pub fn cx(&self) -> u16 {
        self.chs.cx()
    }

    pub fn dx(&self) -> u16 {
        ((self.chs.head() as u16) << 8) | self.drive as u16
    }
}

/// Services the platform firmware provides to the first stage.
///
/// Calls block until the firmware is done; there is no cancellation and no
/// retry at this level.
pub trait Firmware {
    /// INT 13h AH=08h for `drive`.
    fn drive_parameters(&mut self, drive: u8) -> Result<DriveParameters, FirmwareError>;

    /// INT 13h AH=02h into `dest`, which holds exactly `request.count`
    /// sectors. After a failure `dest` may hold anything.
    fn read_sectors(&mut self, request: &ReadRequest, dest: &mut [u8]) -> Result<(), FirmwareError>;

    /// Far jump to `entry` with DL = `drive`. Never returns.
    fn transfer(&mut self, entry: RealModePtr, drive: u8) -> !;

    /// Stop the machine.
    fn halt(&mut self) -> !;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_high_cylinder_bits_into_cl() {
        let chs = ChsAddress::new(0x3FF, 15, 63);
        assert_eq!(chs.cx(), 0xFFFF);
        assert_eq!(chs.cylinder(), 0x3FF);
        assert_eq!(chs.sector(), 63);

        let chs = ChsAddress::new(0x1A5, 1, 7);
        assert_eq!(chs.cx() >> 8, 0xA5);
        assert_eq!(chs.cx() & 0x00C0, 0x40);
        assert_eq!(chs.cylinder(), 0x1A5);
        assert_eq!(chs.head(), 1);
    }

    #[test]
    fn truncates_out_of_range_fields() {
        let chs = ChsAddress::new(1024 + 5, 0, 64 + 2);
        assert_eq!(chs.cylinder(), 5);
        assert_eq!(chs.sector(), 2);
    }

    #[test]
    fn read_request_registers() {
        let request = ReadRequest {
            drive: 0x80,
            chs: ChsAddress::new(0, 1, 2),
            count: 14,
        };
        assert_eq!(request.ax(), 0x020E);
        assert_eq!(request.cx(), 0x0002);
        assert_eq!(request.dx(), 0x0180);
    }

    #[test]
    fn drive_parameters_decode() {
        // 1023 cylinders, 63 sectors, heads 0..=15
        let params = DriveParameters::from_registers(0xFEFF, 0x0F01);
        assert_eq!(params.sectors_per_track, 63);
        assert_eq!(params.max_cylinder, 0x3FE);
        assert_eq!(params.head_count(), 16);
        assert_eq!(params.max_head, 15);
    }
}
