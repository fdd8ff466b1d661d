#![no_std]
#![no_main]

use core::arch::{asm, global_asm};
use core::panic::PanicInfo;

use fatboot::{
    firmware::bios::Bios,
    memory::{IdentityMemory, MemoryLayout},
    LoaderConfig,
};

global_asm!(include_str!("boot.s"));

/// Called by `_start` with the BIOS boot drive (DL) zero-extended.
#[no_mangle]
pub extern "C" fn stage1_main(drive: u16) -> ! {
    let mut firmware = unsafe { Bios::new() };
    let mut memory = unsafe { IdentityMemory::new() };
    let config = LoaderConfig::default().with_drive(drive as u8);

    fatboot::boot(&mut firmware, &mut memory, MemoryLayout::default(), config)
}

#[panic_handler]
fn panic(_info: &PanicInfo<'_>) -> ! {
    loop {
        unsafe {
            asm!("cli", "hlt", options(nomem, nostack));
        }
    }
}
