//! Runtime knobs of the first stage.
//!
//! The defaults are the hardened behavior. `LoaderConfig::legacy` and
//! `LoaderConfig::trunk` follow the decisions of the historical boot
//! sectors where that is memory safe. Two things always differ: reads
//! never leave their region, and a probed head count is DH + 1 where the
//! development sector used DH.

use crate::filesys::fat16::ShortName;

/// File the first stage looks for by default.
pub const DEFAULT_TARGET: ShortName = ShortName::from_raw(*b"IO      SYS");

/// Sectors of the second stage read by default; enough for its entry code.
pub const DEFAULT_STAGE2_SECTORS: u8 = 3;

/// How a directory entry name is compared to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// All 11 bytes equal.
    Exact,
    /// `strncmp(entry, target, count)` as the boot sector spells it: walk
    /// while `i < count - 1` and both bytes are equal and non-zero, then
    /// decide on byte `i`. `count` is clamped to 1..=11; 0 compares byte 0
    /// like 1, as the 16-bit `count - 1` did.
    Legacy { count: usize },
    /// Only the first `n` bytes are compared.
    Prefix(usize),
}

/// Where the directory scan gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanBound {
    /// Stop at the declared root entry count or at the first entry whose
    /// name starts with 0x00.
    Declared,
    /// Ignore both and run on to the end of the directory buffer region.
    Unbounded,
}

/// What a failed firmware call or an unaddressable sector does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log it and carry on with whatever the registers and buffers hold.
    /// CHS fields that overflow are truncated.
    Ignore,
    /// Stop the boot.
    Halt,
}

/// Where the head count for CHS translation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadSource {
    VolumeDescriptor,
    /// Max head index reported by AH=08h, plus one. The development boot
    /// sector used the index itself, one head short.
    Probe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    pub target: ShortName,
    pub stage2_sectors: u8,
    pub name_match: NameMatch,
    pub scan_bound: ScanBound,
    pub failure_policy: FailurePolicy,
    pub head_source: HeadSource,
    /// Drive to use instead of the boot sector's drive number.
    pub drive: Option<u8>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET,
            stage2_sectors: DEFAULT_STAGE2_SECTORS,
            name_match: NameMatch::Exact,
            scan_bound: ScanBound::Declared,
            failure_policy: FailurePolicy::Halt,
            head_source: HeadSource::VolumeDescriptor,
            drive: None,
        }
    }
}

impl LoaderConfig {
    /// Released boot sector: unchecked firmware calls, unbounded scan,
    /// 11-byte `strncmp`.
    pub fn legacy() -> Self {
        Self {
            name_match: NameMatch::Legacy { count: 11 },
            scan_bound: ScanBound::Unbounded,
            failure_policy: FailurePolicy::Ignore,
            ..Self::default()
        }
    }

    /// Development boot sector: like `legacy`, with probed heads (DH + 1)
    /// and a three byte `"IO "` prefix match.
    pub fn trunk() -> Self {
        Self {
            name_match: NameMatch::Legacy { count: 3 },
            head_source: HeadSource::Probe,
            ..Self::legacy()
        }
    }

    pub fn with_target(mut self, target: ShortName) -> Self {
        self.target = target;
        self
    }

    pub fn with_drive(mut self, drive: u8) -> Self {
        self.drive = Some(drive);
        self
    }
}
