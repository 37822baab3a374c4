//! ChaCha20-Poly1305 encryption adapter
//!
//! Ciphertext format (before base64):
//! `version (1 byte) || nonce (12 bytes) || ciphertext || tag (16 bytes)`
//!
//! A fresh random nonce is drawn for every call, so encrypting the same
//! plaintext twice yields different ciphertexts.

use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use pulse_core::{CipherEffects, EncryptionError};
use rand::rngs::OsRng;
use rand::RngCore;

use super::key::{CipherKey, KeySource};

/// Nonce size for ChaCha20-Poly1305 (96 bits = 12 bytes)
const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size
const TAG_SIZE: usize = 16;

/// Version byte for the ciphertext format
const BLOB_VERSION: u8 = 0x01;

/// Encryption adapter over ChaCha20-Poly1305 with a fixed key.
#[derive(Debug, Clone)]
pub struct ChaChaCipherHandler {
    key: CipherKey,
}

impl ChaChaCipherHandler {
    /// Create a handler that encrypts under `key`
    pub fn new(key: CipherKey) -> Self {
        Self { key }
    }

    /// Resolve `source` and create a handler from the result
    pub fn from_source(source: &KeySource) -> Result<Self, EncryptionError> {
        Ok(Self::new(source.resolve()?))
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(self.key.as_bytes()))
    }
}

impl CipherEffects for ChaChaCipherHandler {
    fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| EncryptionError::encryption_failed(e.to_string()))?;

        let mut blob = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        blob.push(BLOB_VERSION);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(blob))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, EncryptionError> {
        let blob = STANDARD
            .decode(ciphertext.trim().as_bytes())
            .map_err(|e| EncryptionError::InvalidEncoding(e.to_string()))?;

        if blob.len() < 1 + NONCE_SIZE + TAG_SIZE {
            return Err(EncryptionError::malformed(format!(
                "blob too short: {} bytes",
                blob.len()
            )));
        }

        let (version, rest) = blob.split_at(1);
        if version[0] != BLOB_VERSION {
            return Err(EncryptionError::UnsupportedVersion(version[0]));
        }

        let (nonce, sealed) = rest.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|e| EncryptionError::decryption_failed(e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| EncryptionError::decryption_failed(format!("plaintext is not UTF-8: {e}")))
    }
}
