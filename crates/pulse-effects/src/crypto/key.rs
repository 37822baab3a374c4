//! Symmetric key material

use base64::{engine::general_purpose::STANDARD, Engine};
use hkdf::Hkdf;
use pulse_core::EncryptionError;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

/// Key length for ChaCha20-Poly1305 (256 bits)
pub const KEY_LEN: usize = 32;

/// HKDF info label binding derived keys to settings encryption
const KEY_DERIVATION_INFO: &[u8] = b"pulse-settings-encryption-v1";

/// A 256-bit symmetric key, zeroed on drop.
#[derive(Clone)]
pub struct CipherKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl CipherKey {
    /// Build a key from raw bytes; the slice must be exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncryptionError> {
        if bytes.len() != KEY_LEN {
            return Err(EncryptionError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: bytes.len(),
            });
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(bytes);
        Ok(Self { bytes: key })
    }

    /// Build a key from its standard base64 encoding.
    pub fn from_base64(encoded: &str) -> Result<Self, EncryptionError> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded.trim().as_bytes())
                .map_err(|e| EncryptionError::KeySourceUnreadable(format!("invalid base64: {e}")))?,
        );
        Self::from_bytes(&decoded)
    }

    /// Read a base64-encoded key from an environment variable.
    pub fn from_env(var: &str) -> Result<Self, EncryptionError> {
        let encoded = Zeroizing::new(
            std::env::var(var)
                .map_err(|e| EncryptionError::KeySourceUnreadable(format!("{var}: {e}")))?,
        );
        Self::from_base64(&encoded)
    }

    /// Derive a key from a high-entropy secret with HKDF-SHA256.
    ///
    /// The salt should be unique per installation and stored next to the
    /// encrypted data; it is not secret.
    pub fn derive_from_secret(secret: &[u8], salt: &[u8]) -> Result<Self, EncryptionError> {
        if secret.is_empty() {
            return Err(EncryptionError::KeySourceUnreadable(
                "secret must not be empty".to_string(),
            ));
        }
        let hkdf = Hkdf::<Sha256>::new(Some(salt), secret);
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        hkdf.expand(KEY_DERIVATION_INFO, key.as_mut_slice())
            .map_err(|e| EncryptionError::KeySourceUnreadable(format!("HKDF expansion failed: {e}")))?;
        Ok(Self { bytes: key })
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(key.as_mut_slice());
        Self { bytes: key }
    }

    /// Standard base64 encoding of the key, for provisioning.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.bytes.as_slice())
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKey([REDACTED])")
    }
}

/// Where key material comes from, as written in configuration.
///
/// ```toml
/// [key]
/// source = "env"
/// var = "PULSE_SETTINGS_KEY"
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum KeySource {
    /// Inline base64 key
    Base64 {
        /// Standard base64 of 32 key bytes
        key: String,
    },
    /// Base64 key read from an environment variable
    Env {
        /// Variable name
        var: String,
    },
    /// Key derived from a secret and salt with HKDF-SHA256
    Secret {
        /// High-entropy secret
        secret: String,
        /// Per-installation salt
        salt: String,
    },
}

impl KeySource {
    /// Load or derive the key this source describes.
    pub fn resolve(&self) -> Result<CipherKey, EncryptionError> {
        match self {
            Self::Base64 { key } => CipherKey::from_base64(key),
            Self::Env { var } => CipherKey::from_env(var),
            Self::Secret { secret, salt } => {
                CipherKey::derive_from_secret(secret.as_bytes(), salt.as_bytes())
            }
        }
    }
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base64 { .. } => f.write_str("KeySource::Base64([REDACTED])"),
            Self::Env { var } => f.debug_struct("KeySource::Env").field("var", var).finish(),
            Self::Secret { .. } => f.write_str("KeySource::Secret([REDACTED])"),
        }
    }
}
