//! Root directory read and the linear search for the second stage.

use super::{config::*, reader, BootContext};
use crate::error::BootError;
use crate::filesys::fat16::constants::{DIR_ENTRY_SIZE, NAME_LENGTH};
use crate::filesys::fat16::DirEntry83;
use crate::firmware::Firmware;
use crate::memory::PhysMemory;
use log::debug;

/// Result of examining one directory slot.
#[derive(Debug, Clone, Copy)]
pub enum ScanStep {
    Match(DirEntry83),
    Continue,
    Stop(ScanOutcome),
}

#[derive(Debug, Clone, Copy)]
pub enum ScanOutcome {
    Found { index: usize, entry: DirEntry83 },
    /// Stopped at the declared entry count or at an end-of-directory entry
    NotFound { scanned: usize },
    /// Ran to the end of the directory buffer region
    Exhausted { scanned: usize },
}

/// Compares an on-disk name field against the target.
pub fn names_match(candidate: &[u8; NAME_LENGTH], target: &[u8; NAME_LENGTH], mode: NameMatch) -> bool {
    match mode {
        NameMatch::Exact => candidate == target,
        NameMatch::Prefix(n) => {
            let n = n.min(NAME_LENGTH);
            candidate[..n] == target[..n]
        }
        NameMatch::Legacy { count } => {
            let last = count.clamp(1, NAME_LENGTH) - 1;
            let mut i = 0;
            while i < last && candidate[i] != 0 && candidate[i] == target[i] {
                i += 1;
            }
            candidate[i] == target[i]
        }
    }
}

/// Reads the whole root directory into the directory region.
pub fn read_directory<F: Firmware, M: PhysMemory>(
    ctx: &mut BootContext,
    firmware: &mut F,
    memory: &mut M,
) -> Result<(), BootError> {
    let lba = ctx.volume.root_dir_start();
    let count = reader::sector_count(ctx, ctx.volume.root_dir_sectors(), lba)?;
    let region = ctx.layout.directory;
    let dest = memory.region_mut(region).ok_or(BootError::Unmapped(region))?;

    debug!("root directory: {} sectors at LBA {}", count, lba);
    reader::read_sectors(ctx, firmware, dest, lba, count)
}

/// Number of slots the scan may look at in a buffer of `buffer_len` bytes.
pub fn scan_limit(ctx: &BootContext, buffer_len: usize) -> usize {
    let slots = buffer_len / DIR_ENTRY_SIZE;
    match ctx.config.scan_bound {
        ScanBound::Declared => {
            let read = ctx.volume.root_dir_sectors() as usize * ctx.volume.bytes_per_sector as usize / DIR_ENTRY_SIZE;
            slots.min(read).min(ctx.volume.root_dir_entries as usize)
        }
        ScanBound::Unbounded => slots,
    }
}

/// Looks at slot `index` of `directory`.
pub fn examine(directory: &[u8], index: usize, ctx: &BootContext) -> ScanStep {
    if index >= scan_limit(ctx, directory.len()) {
        return ScanStep::Stop(match ctx.config.scan_bound {
            ScanBound::Declared => ScanOutcome::NotFound { scanned: index },
            ScanBound::Unbounded => ScanOutcome::Exhausted { scanned: index },
        });
    }

    let offset = index * DIR_ENTRY_SIZE;
    let entry = match DirEntry83::from_bytes(&directory[offset..]) {
        Ok(entry) => entry,
        Err(_) => return ScanStep::Stop(ScanOutcome::Exhausted { scanned: index }),
    };

    if ctx.config.scan_bound == ScanBound::Declared && entry.is_free() {
        return ScanStep::Stop(ScanOutcome::NotFound { scanned: index });
    }

    if names_match(entry.short_name().as_bytes(), ctx.config.target.as_bytes(), ctx.config.name_match) {
        ScanStep::Match(entry)
    } else {
        ScanStep::Continue
    }
}

/// Runs `examine` from slot 0 until it matches or stops.
pub fn scan(directory: &[u8], ctx: &BootContext) -> ScanOutcome {
    let mut index = 0;
    loop {
        match examine(directory, index, ctx) {
            ScanStep::Match(entry) => return ScanOutcome::Found { index, entry },
            ScanStep::Continue => index += 1,
            ScanStep::Stop(outcome) => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesys::fat16::ShortName;
    use crate::loader::tests::{context, FLOPPY};
    use std::vec;
    use std::vec::Vec;

    fn directory(names: &[&[u8; NAME_LENGTH]], slots: usize) -> Vec<u8> {
        let mut buf = vec![0u8; slots * DIR_ENTRY_SIZE];
        for (i, name) in names.iter().enumerate() {
            let entry = DirEntry83::new_file(ShortName::from_raw(**name), 10 + i as u16, 100);
            entry.write_to(&mut buf[i * DIR_ENTRY_SIZE..]).unwrap();
        }
        buf
    }

    fn found_index(outcome: ScanOutcome) -> Option<usize> {
        match outcome {
            ScanOutcome::Found { index, .. } => Some(index),
            _ => None,
        }
    }

    #[test]
    fn finds_each_entry_at_its_index() {
        let names: [&[u8; 11]; 4] = [b"FOO     TXT", b"BAR     BIN", b"IO      SYS", b"MSDOS   SYS"];
        let dir = directory(&names, 224);

        for (k, name) in names.iter().enumerate() {
            let ctx = context(FLOPPY, LoaderConfig::default().with_target(ShortName::from_raw(**name)));
            assert_eq!(found_index(scan(&dir, &ctx)), Some(k));
        }
    }

    #[test]
    fn found_entry_carries_start_cluster() {
        let dir = directory(&[b"FOO     TXT", b"IO      SYS"], 224);
        let ctx = context(FLOPPY, LoaderConfig::default());

        match scan(&dir, &ctx) {
            ScanOutcome::Found { index, entry } => {
                assert_eq!(index, 1);
                assert_eq!({ entry.start_cluster }, 11);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn declared_scan_stops_at_end_marker() {
        let dir = directory(&[b"FOO     TXT", b"BAR     BIN"], 224);
        let ctx = context(FLOPPY, LoaderConfig::default());
        assert!(matches!(scan(&dir, &ctx), ScanOutcome::NotFound { scanned: 2 }));
    }

    #[test]
    fn declared_scan_stops_at_entry_count() {
        let names = [b"FOO     TXT"; 20];
        let mut dir = directory(&names, 20);
        DirEntry83::new_file(ShortName::from_raw(*b"IO      SYS"), 2, 1)
            .write_to(&mut dir[19 * DIR_ENTRY_SIZE..])
            .unwrap();

        let mut volume = FLOPPY;
        volume.root_dir_entries = 16;
        let ctx = context(volume, LoaderConfig::default());
        assert!(matches!(scan(&dir, &ctx), ScanOutcome::NotFound { scanned: 16 }));

        let ctx = context(volume, LoaderConfig::legacy());
        assert_eq!(found_index(scan(&dir, &ctx)), Some(19));
    }

    #[test]
    fn all_zero_target_stops_at_sentinel() {
        let dir = directory(&[b"FOO     TXT"], 224);
        let ctx = context(FLOPPY, LoaderConfig::default().with_target(ShortName::from_raw([0; 11])));
        assert!(matches!(scan(&dir, &ctx), ScanOutcome::NotFound { scanned: 1 }));

        // Without the sentinel check the zero entry itself matches
        let ctx = context(
            FLOPPY,
            LoaderConfig {
                scan_bound: ScanBound::Unbounded,
                ..LoaderConfig::default().with_target(ShortName::from_raw([0; 11]))
            },
        );
        assert_eq!(found_index(scan(&dir, &ctx)), Some(1));
    }

    #[test]
    fn unbounded_scan_runs_to_buffer_end() {
        let dir = directory(&[b"FOO     TXT"], 64);
        let ctx = context(FLOPPY, LoaderConfig::legacy());
        assert!(matches!(scan(&dir, &ctx), ScanOutcome::Exhausted { scanned: 64 }));
    }

    #[test]
    fn one_character_difference() {
        let candidate = b"IO      SY ";
        let target = b"IO      SYS";

        assert!(!names_match(candidate, target, NameMatch::Exact));
        assert!(!names_match(candidate, target, NameMatch::Legacy { count: 11 }));
        assert!(names_match(candidate, target, NameMatch::Prefix(10)));
        assert!(!names_match(candidate, target, NameMatch::Prefix(11)));
    }

    #[test]
    fn three_byte_legacy_match_is_a_prefix() {
        let target = b"IO      SYS";
        assert!(names_match(b"IO      COM", target, NameMatch::Legacy { count: 3 }));
        assert!(names_match(b"IO  X   SYS", target, NameMatch::Legacy { count: 3 }));
        assert!(!names_match(b"IOX     SYS", target, NameMatch::Legacy { count: 3 }));
    }

    #[test]
    fn legacy_match_stops_at_nul() {
        let target = b"IO\0     SYS";
        assert!(names_match(b"IO\0XXXXXXXX", target, NameMatch::Legacy { count: 11 }));
        assert!(!names_match(b"IO\0XXXXXXXX", target, NameMatch::Exact));
    }

    #[test]
    fn legacy_zero_count_compares_first_byte() {
        let target = b"IO      SYS";
        assert!(names_match(b"IXXXXXXXXXX", target, NameMatch::Legacy { count: 0 }));
        assert!(!names_match(b"XO      SYS", target, NameMatch::Legacy { count: 0 }));
        assert_eq!(
            names_match(b"IXXXXXXXXXX", target, NameMatch::Legacy { count: 0 }),
            names_match(b"IXXXXXXXXXX", target, NameMatch::Legacy { count: 1 })
        );
    }

    #[test]
    fn match_is_case_sensitive() {
        assert!(!names_match(b"io      sys", b"IO      SYS", NameMatch::Exact));
    }
}
