use core::fmt;

pub mod fat16;

// Define error types for the filesystem operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// Buffer shorter than the structure being read or written
    InvalidLength,
    /// Boot sector without the 0x55 0xAA trailer
    InvalidSignature,
    /// Parameter block with a zero or unusable divisor
    InvalidBpb,
    InvalidName,
    /// Root directory or cluster area is full
    NoSpace,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::InvalidLength => write!(f, "buffer too short"),
            FsError::InvalidSignature => write!(f, "missing boot signature"),
            FsError::InvalidBpb => write!(f, "invalid BIOS parameter block"),
            FsError::InvalidName => write!(f, "invalid 8.3 name"),
            FsError::NoSpace => write!(f, "no space left on volume"),
        }
    }
}
