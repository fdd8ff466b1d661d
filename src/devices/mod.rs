//! Output devices available before any driver is loaded.

pub mod serial;
