//! Symmetric cipher effect
//!
//! The encryption adapter the settings store is written against. Operations
//! are synchronous and side-effect free; key material is owned by the
//! implementation and fixed at construction.

use std::sync::Arc;

use crate::errors::EncryptionError;

/// Symmetric string-to-string encryption.
///
/// Implementations must never panic on hostile input: stale, truncated or
/// foreign ciphertext is reported as an `EncryptionError`.
pub trait CipherEffects: Send + Sync {
    /// Encrypt `plaintext` into a printable ciphertext.
    fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError>;

    /// Decrypt a ciphertext previously produced by `encrypt`.
    fn decrypt(&self, ciphertext: &str) -> Result<String, EncryptionError>;
}

impl<T: CipherEffects + ?Sized> CipherEffects for Arc<T> {
    fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        (**self).encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, EncryptionError> {
        (**self).decrypt(ciphertext)
    }
}
