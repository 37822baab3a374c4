//! Error types for the effect interfaces
//!
//! Each effect family carries its own error enum. Higher layers wrap these
//! with `#[from]` conversions rather than flattening them into strings.

use serde::{Deserialize, Serialize};

/// Errors reported by a preference substrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum StorageError {
    /// The current snapshot could not be read
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// A commit could not be written
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// The persisted document exists but cannot be parsed
    #[error("Storage corrupted: {reason}")]
    Corrupted {
        /// Parser or I/O detail describing the corruption
        reason: String,
    },

    /// A key was rejected by the substrate
    #[error("Invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },

    /// The change stream ended before yielding a snapshot
    #[error("Change stream closed")]
    ChangeStreamClosed,

    /// The substrate was configured with unusable settings
    #[error("Configuration error: {reason}")]
    ConfigurationError {
        /// Description of the configuration problem
        reason: String,
    },
}

impl StorageError {
    /// Create a corruption error
    pub fn corrupted(reason: impl Into<String>) -> Self {
        Self::Corrupted {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::ConfigurationError {
            reason: reason.into(),
        }
    }
}

/// Errors reported by a cipher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum EncryptionError {
    /// Key material has the wrong size
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required key length in bytes
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Key material could not be loaded from its source
    #[error("Key source unreadable: {0}")]
    KeySourceUnreadable(String),

    /// Text form of the ciphertext is not valid base64
    #[error("Invalid ciphertext encoding: {0}")]
    InvalidEncoding(String),

    /// Ciphertext is structurally invalid (truncated, wrong layout)
    #[error("Malformed ciphertext: {reason}")]
    Malformed {
        /// What was wrong with the blob
        reason: String,
    },

    /// Ciphertext was produced by an unknown format version
    #[error("Unsupported ciphertext version: {0}")]
    UnsupportedVersion(u8),

    /// The primitive refused to encrypt
    #[error("Encryption failed: {reason}")]
    EncryptionFailed {
        /// Detail from the primitive
        reason: String,
    },

    /// Authentication or decoding of the plaintext failed
    #[error("Decryption failed: {reason}")]
    DecryptionFailed {
        /// Detail from the primitive
        reason: String,
    },
}

impl EncryptionError {
    /// Create a malformed-ciphertext error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Create an encryption failure
    pub fn encryption_failed(reason: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            reason: reason.into(),
        }
    }

    /// Create a decryption failure
    pub fn decryption_failed(reason: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            reason: reason.into(),
        }
    }
}
