//! The first stage proper.
//!
//! `Loader` walks a fixed sequence of states: probe the drive, read the
//! root directory, scan it one entry per step, compute the file's first
//! sector, read it, jump. Any error halts. There are no retries and no
//! way back to an earlier state.

pub mod chain;
pub mod config;
pub mod geometry;
pub mod reader;
pub mod scanner;

use crate::error::BootError;
use crate::filesys::fat16::{BootSector, VolumeDescriptor};
use crate::firmware::Firmware;
use crate::memory::{MemoryLayout, PhysMemory};
use chain::Handoff;
use config::LoaderConfig;
use log::{debug, error, info};
use scanner::{ScanOutcome, ScanStep};

/// What the loader knows about the drive it is reading from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub sectors_per_track: u16,
    pub heads: u16,
    /// Start of the most recent read
    pub lba: u32,
}

/// State shared by every step of the boot.
#[derive(Debug, Clone, Copy)]
pub struct BootContext {
    pub volume: VolumeDescriptor,
    pub device: DeviceState,
    pub layout: MemoryLayout,
    pub config: LoaderConfig,
    /// Drive all firmware calls go to
    pub drive: u8,
}

impl BootContext {
    pub fn new(volume: VolumeDescriptor, layout: MemoryLayout, config: LoaderConfig) -> Self {
        Self {
            volume,
            device: DeviceState::default(),
            layout,
            config,
            drive: config.drive.unwrap_or(volume.drive_number),
        }
    }

    /// Validates `layout` and reads the parameter block of the boot sector
    /// sitting in the loader region.
    pub fn load<M: PhysMemory>(memory: &M, layout: MemoryLayout, config: LoaderConfig) -> Result<Self, BootError> {
        layout.validate()?;
        let sector = memory.region(layout.loader).ok_or(BootError::Unmapped(layout.loader))?;
        let volume = BootSector::from_sector(sector)?.descriptor();
        Ok(Self::new(volume, layout, config))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    ProbeGeometry,
    ReadDirectory,
    /// Next directory slot to look at
    Scanning { index: usize },
    Found { cluster: u16 },
    ReadFile { lba: u32 },
    Jump(Handoff),
    Halted(BootError),
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Jump(_) | State::Halted(_))
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Jump(Handoff),
    Halted(BootError),
}

pub struct Loader<'a, F: Firmware, M: PhysMemory> {
    context: BootContext,
    firmware: &'a mut F,
    memory: &'a mut M,
    state: State,
}

impl<'a, F: Firmware, M: PhysMemory> Loader<'a, F, M> {
    pub fn new(firmware: &'a mut F, memory: &'a mut M, context: BootContext) -> Self {
        Self {
            context,
            firmware,
            memory,
            state: State::Init,
        }
    }

    pub fn context(&self) -> &BootContext {
        &self.context
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Performs one transition. Terminal states stay where they are.
    pub fn step(&mut self) -> &State {
        if !self.state.is_terminal() {
            self.state = match self.advance() {
                Ok(next) => next,
                Err(error) => {
                    error!("boot failed: {}", error);
                    State::Halted(error)
                }
            };
        }
        &self.state
    }

    fn advance(&mut self) -> Result<State, BootError> {
        let ctx = &mut self.context;

        match self.state {
            State::Init => {
                info!(
                    "fatboot: drive {:#04x}, looking for {}",
                    ctx.drive, ctx.config.target
                );
                Ok(State::ProbeGeometry)
            }
            State::ProbeGeometry => {
                geometry::probe(ctx, self.firmware)?;
                Ok(State::ReadDirectory)
            }
            State::ReadDirectory => {
                scanner::read_directory(ctx, self.firmware, self.memory)?;
                Ok(State::Scanning { index: 0 })
            }
            State::Scanning { index } => {
                let region = ctx.layout.directory;
                let directory = self.memory.region(region).ok_or(BootError::Unmapped(region))?;

                match scanner::examine(directory, index, ctx) {
                    ScanStep::Match(entry) => {
                        let cluster = entry.start_cluster;
                        debug!("{} at slot {}, cluster {}", entry.short_name(), index, cluster);
                        Ok(State::Found { cluster })
                    }
                    ScanStep::Continue => Ok(State::Scanning { index: index + 1 }),
                    ScanStep::Stop(outcome) => {
                        if let ScanOutcome::Exhausted { scanned } | ScanOutcome::NotFound { scanned } = outcome {
                            debug!("{} not among {} entries", ctx.config.target, scanned);
                        }
                        Err(BootError::FileNotFound)
                    }
                }
            }
            State::Found { cluster } => Ok(State::ReadFile {
                lba: chain::file_lba(ctx, cluster)?,
            }),
            State::ReadFile { lba } => {
                let handoff = chain::load_stage2(ctx, self.firmware, self.memory, lba)?;
                Ok(State::Jump(handoff))
            }
            State::Jump(_) | State::Halted(_) => Ok(self.state),
        }
    }

    /// Steps until a terminal state.
    pub fn run(&mut self) -> Outcome {
        loop {
            match *self.step() {
                State::Jump(handoff) => return Outcome::Jump(handoff),
                State::Halted(error) => return Outcome::Halted(error),
                _ => {}
            }
        }
    }

    /// Runs to completion and either enters the second stage or halts.
    pub fn boot(mut self) -> ! {
        match self.run() {
            Outcome::Jump(handoff) => handoff.execute(self.firmware),
            Outcome::Halted(_) => self.firmware.halt(),
        }
    }
}

/// Boots from the volume whose boot sector sits in `layout.loader`.
pub fn boot<F: Firmware, M: PhysMemory>(
    firmware: &mut F,
    memory: &mut M,
    layout: MemoryLayout,
    config: LoaderConfig,
) -> ! {
    match BootContext::load(memory, layout, config) {
        Ok(context) => Loader::new(firmware, memory, context).boot(),
        Err(error) => {
            error!("boot failed: {}", error);
            firmware.halt()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::filesys::fat16::constants::{MEDIA_FLOPPY_1440, SECTOR_SIZE};
    use crate::filesys::fat16::format::{self, FormatParams};
    use crate::filesys::fat16::ShortName;
    use crate::firmware::disk_image::DiskImage;
    use crate::firmware::FirmwareError;
    use crate::memory::BufferMemory;
    use std::vec;
    use std::vec::Vec;
    use x86_64::PhysAddr;

    /// 1.44 MB floppy with 4-sector clusters: root directory at 19,
    /// 14 sectors long, data area at 33.
    pub(crate) const FLOPPY: VolumeDescriptor = VolumeDescriptor {
        bytes_per_sector: 512,
        sectors_per_cluster: 4,
        reserved_sectors: 1,
        fat_count: 2,
        sectors_per_fat: 9,
        root_dir_entries: 224,
        sectors_per_track: 18,
        head_count: 2,
        media_type: MEDIA_FLOPPY_1440,
        drive_number: 0,
    };

    pub(crate) fn context(volume: VolumeDescriptor, config: LoaderConfig) -> BootContext {
        BootContext::new(volume, MemoryLayout::default(), config)
    }

    fn floppy_image(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut image = vec![0u8; 2880 * SECTOR_SIZE];
        let params = FormatParams {
            sectors_per_cluster: 4,
            ..FormatParams::floppy_1440()
        };
        format::format(&mut image, &params).unwrap();
        for (name, contents) in files {
            format::add_file(&mut image, ShortName::parse(name).unwrap(), contents).unwrap();
        }
        image
    }

    /// Low 64 KiB of memory with the image's boot sector at 0x7C00.
    fn low_memory(image: &[u8]) -> Vec<u8> {
        let mut memory = vec![0u8; 0x1_0000];
        memory[0x7C00..0x7E00].copy_from_slice(&image[..SECTOR_SIZE]);
        memory
    }

    #[test]
    fn context_drive_defaults_to_volume() {
        assert_eq!(context(FLOPPY, LoaderConfig::default()).drive, 0);
        assert_eq!(context(FLOPPY, LoaderConfig::default().with_drive(0x80)).drive, 0x80);
    }

    #[test]
    fn walks_every_state_in_order() {
        let image = floppy_image(&[("FOO.TXT", &b"foo"[..]), ("IO.SYS", &[0xEB; 1536][..])]);
        let mut ram = low_memory(&image);
        let mut disk = DiskImage::new(&image, 0, 2, 18);
        let mut memory = BufferMemory::new(PhysAddr::new(0), &mut ram);

        let context = BootContext::load(&memory, MemoryLayout::default(), LoaderConfig::default()).unwrap();
        let mut loader = Loader::new(&mut disk, &mut memory, context);

        assert_eq!(*loader.state(), State::Init);
        assert_eq!(*loader.step(), State::ProbeGeometry);
        assert_eq!(*loader.step(), State::ReadDirectory);
        assert_eq!(*loader.step(), State::Scanning { index: 0 });
        assert_eq!(*loader.step(), State::Scanning { index: 1 });
        assert_eq!(*loader.step(), State::Found { cluster: 3 });
        assert_eq!(*loader.step(), State::ReadFile { lba: 37 });
        assert!(matches!(*loader.step(), State::Jump(_)));
        assert_eq!(loader.context().device.lba, 37);

        let before = *loader.state();
        assert_eq!(*loader.step(), before);
    }

    #[test]
    fn missing_file_halts() {
        let image = floppy_image(&[("FOO.TXT", &b"foo"[..])]);
        let mut ram = low_memory(&image);
        let mut disk = DiskImage::new(&image, 0, 2, 18);
        let mut memory = BufferMemory::new(PhysAddr::new(0), &mut ram);

        let context = BootContext::load(&memory, MemoryLayout::default(), LoaderConfig::default()).unwrap();
        let mut loader = Loader::new(&mut disk, &mut memory, context);
        assert_eq!(loader.run(), Outcome::Halted(BootError::FileNotFound));
        assert!(loader.state().is_terminal());
    }

    #[test]
    fn probe_failure_halts_before_any_read() {
        let image = floppy_image(&[("IO.SYS", &b"stage2"[..])]);
        let mut ram = low_memory(&image);
        let mut disk = DiskImage::new(&image, 0, 2, 18).fail_probe(FirmwareError::DRIVE_NOT_READY);
        let mut memory = BufferMemory::new(PhysAddr::new(0), &mut ram);

        let context = BootContext::load(&memory, MemoryLayout::default(), LoaderConfig::default()).unwrap();
        let outcome = Loader::new(&mut disk, &mut memory, context).run();
        assert_eq!(
            outcome,
            Outcome::Halted(BootError::GeometryProbe(FirmwareError::DRIVE_NOT_READY))
        );
        assert!(disk.requests().is_empty());
    }

    #[test]
    fn ignored_probe_failure_ends_in_invalid_geometry() {
        let image = floppy_image(&[("IO.SYS", &b"stage2"[..])]);
        let mut ram = low_memory(&image);
        let mut disk = DiskImage::new(&image, 0, 2, 18).fail_probe(FirmwareError::DRIVE_NOT_READY);
        let mut memory = BufferMemory::new(PhysAddr::new(0), &mut ram);

        let context = BootContext::load(&memory, MemoryLayout::default(), LoaderConfig::legacy()).unwrap();
        let outcome = Loader::new(&mut disk, &mut memory, context).run();
        assert_eq!(outcome, Outcome::Halted(BootError::InvalidGeometry));
    }

    #[test]
    fn load_rejects_missing_signature() {
        let image = floppy_image(&[]);
        let mut ram = low_memory(&image);
        ram[0x7DFE] = 0;
        let memory = BufferMemory::new(PhysAddr::new(0), &mut ram);

        assert!(matches!(
            BootContext::load(&memory, MemoryLayout::default(), LoaderConfig::default()),
            Err(BootError::Volume(crate::filesys::FsError::InvalidSignature))
        ));
    }

    #[test]
    #[should_panic(expected = "disk image halted")]
    fn boot_halts_on_bad_layout() {
        let image = floppy_image(&[]);
        let mut ram = low_memory(&image);
        let mut disk = DiskImage::new(&image, 0, 2, 18);
        let mut memory = BufferMemory::new(PhysAddr::new(0), &mut ram);

        let mut layout = MemoryLayout::default();
        layout.stage2 = layout.directory;
        boot(&mut disk, &mut memory, layout, LoaderConfig::default());
    }
}
