//! Settings store errors

use pulse_core::{EncryptionError, StorageError};

/// Errors surfaced by settings store writes, clears and configuration.
///
/// Reads never produce these; see `pipeline` for how read failures are
/// absorbed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// Encryption failed and the write policy is `Abort`
    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    /// The record could not be encoded to text
    #[error("Encode failed: {reason}")]
    Encode {
        /// Serializer detail
        reason: String,
    },

    /// Decrypted text is not a valid record encoding
    #[error("Decode failed: {reason}")]
    Decode {
        /// Parser detail
        reason: String,
    },

    /// The substrate refused the commit or could not be read
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// `clear_all` removed some keys but not all
    #[error("Clear incomplete: removed {removed} keys, failed to remove {failed:?}")]
    PartialClear {
        /// Keys successfully removed
        removed: usize,
        /// Keys that are still present
        failed: Vec<String>,
    },

    /// Configuration is missing, unreadable or invalid
    #[error("Configuration error: {reason}")]
    Config {
        /// What was wrong
        reason: String,
    },
}

impl SettingsError {
    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
