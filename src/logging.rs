//! Loader logging facility
//!
//! Routes the `log` macros to COM1 for x86 hosts that run the loader from
//! something larger than a boot sector. The `bios` feature compiles every
//! log statement out (`log/max_level_off`) and the `stage1` binary never
//! installs this logger.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

/// Global logger instance
pub static LOGGER: Logger = Logger::new();

/// Serializes lines so two records never interleave on the port
pub struct Logger {
    inner: Mutex<()>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub const fn new() -> Logger {
        Logger {
            inner: Mutex::new(()),
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    /// Formats messages as "[LEVEL] message"
    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _guard = self.inner.lock();
            crate::serial_println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs `LOGGER`.
///
/// Debug builds log at `Debug`, release builds at `Info`. Fails if a
/// logger is already installed.
pub fn init() -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(
        #[cfg(debug_assertions)]
        LevelFilter::Debug,
        #[cfg(not(debug_assertions))]
        LevelFilter::Info,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn enabled_follows_max_level() {
        log::set_max_level(LevelFilter::Info);
        let logger = Logger::new();

        assert!(logger.enabled(&Metadata::builder().level(Level::Error).build()));
        assert!(logger.enabled(&Metadata::builder().level(Level::Info).build()));
        assert!(!logger.enabled(&Metadata::builder().level(Level::Debug).build()));
    }

    #[cfg(feature = "bios")]
    #[test]
    fn boot_sector_build_compiles_out_logs() {
        assert_eq!(log::STATIC_MAX_LEVEL, LevelFilter::Off);
    }
}
