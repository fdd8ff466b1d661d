//! I/O port definitions.

/// COM1, the log sink for the first stage.
pub const SERIAL_PORT: u16 = 0x3F8;
