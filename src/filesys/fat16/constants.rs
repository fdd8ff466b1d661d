//! FAT12/16 on-disk constants

/// Size of a disk sector in bytes
pub const SECTOR_SIZE: usize = 512;

/// Size of a root directory entry in bytes
pub const DIR_ENTRY_SIZE: usize = 32;

/// Length of the space-padded 8.3 name field (name + extension)
pub const NAME_LENGTH: usize = 11;

/// Maximum length of filename excluding extension
pub const MAX_FILENAME_LENGTH: usize = 8;

/// Maximum length of file extension
pub const MAX_EXTENSION_LENGTH: usize = 3;

/// First cluster number of the data area; 0 and 1 are reserved
pub const FIRST_DATA_CLUSTER: u16 = 2;

/// Offset of the 0x55 0xAA trailer inside the boot sector
pub const SIGNATURE_OFFSET: usize = 510;

/// Boot sector trailer, little endian 0xAA55
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// Extended boot signature marking the volume id/label/type fields valid
pub const EXTENDED_BOOT_SIGNATURE: u8 = 0x29;

/// File attribute: Archive
pub const ATTR_ARCHIVE: u8 = 0x20;

/// First name byte of an entry that ends the directory
pub const END_OF_DIRECTORY_MARKER: u8 = 0x00;

/// Marker for deleted directory entries
pub const DELETED_ENTRY_MARKER: u8 = 0xE5;

/// Media descriptor for fixed disks
pub const MEDIA_FIXED_DISK: u8 = 0xF8;

/// Media descriptor for 1.44 MB floppies
pub const MEDIA_FLOPPY_1440: u8 = 0xF0;
