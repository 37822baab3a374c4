//! Cipher doubles

use std::sync::atomic::{AtomicBool, Ordering};

use pulse_core::{CipherEffects, EncryptionError};

/// Prefix marking a `TransparentCipher` ciphertext
const TRANSPARENT_PREFIX: &str = "sealed:";

/// Readable stand-in cipher: `encrypt` prefixes, `decrypt` strips.
///
/// Anything without the prefix fails to decrypt, which makes it easy to
/// plant "foreign" ciphertext in a slot.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransparentCipher;

impl CipherEffects for TransparentCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        Ok(format!("{TRANSPARENT_PREFIX}{plaintext}"))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, EncryptionError> {
        ciphertext
            .strip_prefix(TRANSPARENT_PREFIX)
            .map(str::to_owned)
            .ok_or_else(|| EncryptionError::decryption_failed("missing transparent prefix"))
    }
}

/// Wraps a cipher and fails either direction on demand.
#[derive(Debug, Default)]
pub struct FaultyCipher<C> {
    inner: C,
    fail_encrypt: AtomicBool,
    fail_decrypt: AtomicBool,
}

impl<C: CipherEffects> FaultyCipher<C> {
    /// Wrap `inner`; no faults are armed initially
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            fail_encrypt: AtomicBool::new(false),
            fail_decrypt: AtomicBool::new(false),
        }
    }

    /// Make every `encrypt` fail (or succeed again)
    pub fn fail_encryption(&self, fail: bool) {
        self.fail_encrypt.store(fail, Ordering::SeqCst);
    }

    /// Make every `decrypt` fail (or succeed again)
    pub fn fail_decryption(&self, fail: bool) {
        self.fail_decrypt.store(fail, Ordering::SeqCst);
    }
}

impl<C: CipherEffects> CipherEffects for FaultyCipher<C> {
    fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        if self.fail_encrypt.load(Ordering::SeqCst) {
            return Err(EncryptionError::encryption_failed("injected encryption fault"));
        }
        self.inner.encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, EncryptionError> {
        if self.fail_decrypt.load(Ordering::SeqCst) {
            return Err(EncryptionError::decryption_failed("injected decryption fault"));
        }
        self.inner.decrypt(ciphertext)
    }
}
