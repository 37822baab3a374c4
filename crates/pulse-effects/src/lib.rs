//! Pulse Effects - Production Handlers
//!
//! Implementations of the `pulse-core` effect interfaces:
//!
//! - `storage`: `MemoryPreferenceHandler` and `FilesystemPreferenceHandler`,
//!   substrates with a watch-based change stream and single-writer edits
//! - `crypto`: `ChaChaCipherHandler` and its key material (`CipherKey`,
//!   `KeySource`)
//!
//! Test doubles with fault injection live in `pulse-testkit`.

#![forbid(unsafe_code)]

pub mod crypto;
pub mod storage;

pub use crypto::{ChaChaCipherHandler, CipherKey, KeySource};
pub use storage::{
    CorruptionPolicy, FilesystemPreferenceConfig, FilesystemPreferenceHandler,
    MemoryPreferenceHandler,
};
