//! Real-mode memory: named regions and access to them.
//!
//! The first stage works on three fixed buffers (its own boot sector, the
//! directory scan buffer and the second stage target) plus its stack. They
//! are passed around as a `MemoryLayout` rather than hard-coded, and the
//! layout is checked once before anything is read.

mod layout;
mod physical;

pub use layout::{LayoutError, MemoryLayout, RealModePtr, Region, RegionKind};
pub use physical::{BufferMemory, IdentityMemory, PhysMemory};
