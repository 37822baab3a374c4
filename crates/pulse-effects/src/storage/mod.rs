//! Preference substrate handlers
//!
//! Both handlers keep the committed snapshot in a `PreferenceCell` so change
//! notification and edit serialization behave identically; they differ only
//! in whether a commit is also written to disk.

mod cell;
pub mod filesystem;
pub mod memory;

pub use filesystem::{CorruptionPolicy, FilesystemPreferenceConfig, FilesystemPreferenceHandler};
pub use memory::MemoryPreferenceHandler;
