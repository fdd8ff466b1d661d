//! FAT12/16 directory entry structure and operations

use super::constants::*;
use crate::filesys::FsError;
use core::fmt;

/// Space-padded 8.3 name exactly as stored on disk, e.g. `b"IO      SYS"`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShortName(pub [u8; NAME_LENGTH]);

impl ShortName {
    pub const fn from_raw(raw: [u8; NAME_LENGTH]) -> Self {
        Self(raw)
    }

    /// Builds the on-disk form of a dotted name such as `"io.sys"`.
    ///
    /// Letters are upper-cased the way DOS stores them; anything longer than
    /// 8 + 3 characters or containing a second dot is rejected.
    pub fn parse(name: &str) -> Result<Self, FsError> {
        let (base, ext) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => (name, ""),
        };

        if base.is_empty()
            || base.len() > MAX_FILENAME_LENGTH
            || ext.len() > MAX_EXTENSION_LENGTH
            || base.contains('.')
        {
            return Err(FsError::InvalidName);
        }

        let mut raw = [b' '; NAME_LENGTH];
        for (slot, byte) in raw.iter_mut().zip(base.bytes()) {
            *slot = byte.to_ascii_uppercase();
        }
        for (slot, byte) in raw[MAX_FILENAME_LENGTH..].iter_mut().zip(ext.bytes()) {
            *slot = byte.to_ascii_uppercase();
        }

        if raw.iter().any(|&b| b < b' ' || b == b'/' || b == b'\\') {
            return Err(FsError::InvalidName);
        }

        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; NAME_LENGTH] {
        &self.0
    }
}

impl fmt::Display for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (base, ext) = self.0.split_at(MAX_FILENAME_LENGTH);
        let base_end = base.iter().rposition(|&b| b != b' ').map_or(0, |p| p + 1);
        let ext_end = ext.iter().rposition(|&b| b != b' ').map_or(0, |p| p + 1);

        for &b in &base[..base_end] {
            write!(f, "{}", b as char)?;
        }
        if ext_end > 0 {
            write!(f, ".")?;
            for &b in &ext[..ext_end] {
                write!(f, "{}", b as char)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortName(\"")?;
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        write!(f, "\")")
    }
}

/// 8.3 format directory entry (32 bytes)
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct DirEntry83 {
    /// 8 character filename
    pub name: [u8; 8],

    /// 3 character extension
    pub ext: [u8; 3],

    /// File attributes (read-only, directory, etc)
    pub attributes: u8,

    /// Reserved
    pub reserved: u8,

    /// Creation time, tenths of a second
    pub create_time_tenths: u8,

    /// Creation time
    pub create_time: u16,

    /// Creation date
    pub create_date: u16,

    /// Last access date
    pub access_date: u16,

    /// High cluster word, always zero on FAT12/16
    pub reserved_high_cluster: u16,

    /// Modification time
    pub time: u16,

    /// Modification date
    pub date: u16,

    /// First cluster number
    pub start_cluster: u16,

    /// File size in bytes
    pub file_size: u32,
}

impl DirEntry83 {
    /// Creates a new file entry with given name and starting cluster
    pub fn new_file(name: ShortName, start_cluster: u16, file_size: u32) -> Self {
        let mut entry = Self {
            name: [0x20; 8],
            ext: [0x20; 3],
            attributes: ATTR_ARCHIVE,
            reserved: 0,
            create_time_tenths: 0,
            create_time: 0,
            create_date: 0,
            access_date: 0,
            reserved_high_cluster: 0,
            time: 0,
            date: 0,
            start_cluster,
            file_size,
        };

        entry.name.copy_from_slice(&name.0[..MAX_FILENAME_LENGTH]);
        entry.ext.copy_from_slice(&name.0[MAX_FILENAME_LENGTH..]);
        entry
    }

    /// Reads an entry from the first 32 bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FsError> {
        if bytes.len() < DIR_ENTRY_SIZE {
            return Err(FsError::InvalidLength);
        }
        Ok(unsafe { core::ptr::read_unaligned(bytes.as_ptr() as *const DirEntry83) })
    }

    /// Writes the entry into the first 32 bytes of `bytes`.
    pub fn write_to(&self, bytes: &mut [u8]) -> Result<(), FsError> {
        if bytes.len() < DIR_ENTRY_SIZE {
            return Err(FsError::InvalidLength);
        }
        unsafe { core::ptr::write_unaligned(bytes.as_mut_ptr() as *mut DirEntry83, *self) };
        Ok(())
    }

    /// The 11-byte name field as stored.
    pub fn short_name(&self) -> ShortName {
        let mut raw = [0u8; NAME_LENGTH];
        raw[..MAX_FILENAME_LENGTH].copy_from_slice(&self.name);
        raw[MAX_FILENAME_LENGTH..].copy_from_slice(&self.ext);
        ShortName(raw)
    }

    /// Returns true if entry is marked as deleted
    pub fn is_deleted(&self) -> bool {
        self.name[0] == DELETED_ENTRY_MARKER
    }

    /// Returns true if this entry and every later one are unused
    pub fn is_free(&self) -> bool {
        self.name[0] == END_OF_DIRECTORY_MARKER
    }
}

impl fmt::Debug for DirEntry83 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attributes = self.attributes;
        let start_cluster = self.start_cluster;
        let file_size = self.file_size;
        f.debug_struct("DirEntry83")
            .field("name", &self.short_name())
            .field("attributes", &attributes)
            .field("start_cluster", &start_cluster)
            .field("file_size", &file_size)
            .finish()
    }
}
