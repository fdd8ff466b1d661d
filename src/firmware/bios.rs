//! INT 13h disk services and the real-mode far jump.
//!
//! Only built for the 16-bit boot sector target. Status comes back in AH:
//! zero on success, the BIOS error code otherwise.

use super::{DriveParameters, Firmware, FirmwareError, ReadRequest};
use crate::constants::bios::{DISK_SERVICE_VECTOR, GET_DRIVE_PARAMETERS};
use crate::memory::RealModePtr;
use core::arch::asm;
use x86_64::PhysAddr;

pub struct Bios {
    _private: (),
}

impl Bios {
    /// # Safety
    /// Real mode with the BIOS interrupt vectors intact.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

fn status(ax: u16) -> Result<(), FirmwareError> {
    match (ax >> 8) as u8 {
        0 => Ok(()),
        status => Err(FirmwareError { status }),
    }
}

impl Firmware for Bios {
    fn drive_parameters(&mut self, drive: u8) -> Result<DriveParameters, FirmwareError> {
        let ax: u16;
        let cx: u16;
        let dx: u16;

        unsafe {
            // ES:DI = 0000:0000 works around BIOSes that read a pointer there
            asm!(
                "push es",
                "xor di, di",
                "mov es, di",
                "int {vector}",
                "pop es",
                vector = const DISK_SERVICE_VECTOR,
                inout("ax") (GET_DRIVE_PARAMETERS as u16) << 8 => ax,
                out("cx") cx,
                inout("dx") drive as u16 => dx,
                out("bx") _,
                out("di") _,
            );
        }

        status(ax)?;
        Ok(DriveParameters::from_registers(cx, dx))
    }

    fn read_sectors(&mut self, request: &ReadRequest, dest: &mut [u8]) -> Result<(), FirmwareError> {
        let buffer = RealModePtr::from_phys(PhysAddr::new(dest.as_mut_ptr() as usize as u64))
            .ok_or(FirmwareError::INVALID_COMMAND)?;
        let ax: u16;

        unsafe {
            asm!(
                "push es",
                "mov es, {segment:x}",
                "int {vector}",
                "pop es",
                vector = const DISK_SERVICE_VECTOR,
                segment = in(reg) buffer.segment,
                inout("ax") request.ax() => ax,
                in("bx") buffer.offset,
                in("cx") request.cx(),
                inout("dx") request.dx() => _,
            );
        }

        status(ax)
    }

    fn transfer(&mut self, entry: RealModePtr, drive: u8) -> ! {
        unsafe {
            asm!(
                "push {segment:x}",
                "push {offset:x}",
                "retf",
                segment = in(reg) entry.segment,
                offset = in(reg) entry.offset,
                in("dx") drive as u16,
                options(noreturn),
            );
        }
    }

    fn halt(&mut self) -> ! {
        loop {
            unsafe {
                asm!("cli", "hlt", options(nomem, nostack));
            }
        }
    }
}
