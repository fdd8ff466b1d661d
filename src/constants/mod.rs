//! System-wide constants and firmware-specific values.

pub mod bios;
pub mod memory;
pub mod ports;
