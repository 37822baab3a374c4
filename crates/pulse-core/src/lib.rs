//! Pulse Core - Effect Interfaces
//!
//! This crate defines the contracts the settings store is written against and
//! nothing else. It contains no storage engine, no cipher, and no runtime.
//!
//! ## Effect Interfaces (Pure Signatures)
//! - `PreferenceStorageEffects`: durable key-value substrate with change
//!   notification (`data`, `edit`, `snapshot`, `keys`)
//! - `CipherEffects`: symmetric `encrypt`/`decrypt` over strings
//!
//! ## Error Taxonomy
//! - `StorageError`: the substrate could not be read or committed
//! - `EncryptionError`: the cipher rejected its input or key material

#![forbid(unsafe_code)]

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Error types shared by every layer
pub mod errors;

pub use effects::{
    mutation, CipherEffects, PreferenceStorageEffects, Preferences, PreferencesMutation,
    PreferencesStream,
};
pub use errors::{EncryptionError, StorageError};
