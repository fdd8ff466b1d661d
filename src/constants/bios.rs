//! BIOS disk service numbers and register layouts.

/// Software interrupt vector for disk services.
pub const DISK_SERVICE_VECTOR: u8 = 0x13;

/// AH value: read sectors into ES:BX.
pub const READ_SECTORS: u8 = 0x02;

/// AH value: get drive parameters.
pub const GET_DRIVE_PARAMETERS: u8 = 0x08;

/// Sector number occupies CL bits 0-5.
pub const SECTOR_MASK: u16 = 0x003F;

/// Cylinder bits 8-9 live in CL bits 6-7.
pub const CYLINDER_HIGH_MASK: u16 = 0x0300;

pub const MAX_CYLINDER: u32 = 1023;
pub const MAX_HEAD: u32 = 255;
pub const MAX_SECTOR: u32 = 63;
