//! Real-mode memory map used by the first stage.
//!
//! Everything lives below the 1 MiB real-mode boundary. The regions are
//! only defaults; `MemoryLayout` takes them as parameters and checks that
//! they stay disjoint.

/// Highest addressable byte (exclusive) in real mode.
pub const REAL_MODE_LIMIT: u64 = 0x10_0000;

/// Address the firmware loads the boot sector to.
pub const LOADER_BASE: u64 = 0x7C00;
pub const LOADER_SIZE: u64 = 0x200;

/// Root directory scan buffer. Large enough for a 512-entry FAT16 root.
pub const DIRECTORY_BASE: u64 = 0x0500;
pub const DIRECTORY_SIZE: u64 = 0x4000;

/// Stack grows down from the loader base.
pub const STACK_BASE: u64 = 0x6000;
pub const STACK_SIZE: u64 = LOADER_BASE - STACK_BASE;

/// Second stage load target, entered at its first byte.
pub const STAGE2_BASE: u64 = 0x8000;
pub const STAGE2_SIZE: u64 = 0x8000;
