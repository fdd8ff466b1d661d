#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod constants;
pub mod error;
pub mod filesys;
pub mod firmware;
pub mod loader;
pub mod memory;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod devices;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod logging;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use devices::serial;

pub use error::BootError;
pub use loader::{boot, config::LoaderConfig, BootContext, Loader, Outcome, State};
