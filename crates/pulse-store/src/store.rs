//! Secure settings store

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use pulse_core::{mutation, CipherEffects, PreferenceStorageEffects};
use pulse_effects::{ChaChaCipherHandler, CipherKey, FilesystemPreferenceHandler};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::{encode_record, SettingsRecord};
use crate::config::SecureStoreConfig;
use crate::errors::SettingsError;
use crate::pipeline::{
    decode_or_default, decrypt_or_empty, distinct_until_changed, recover_snapshot, seal_for_write,
};
use crate::profile::UserProfile;

/// Live stream of decoded records
pub type ProfileStream<T> = BoxStream<'static, T>;

/// Encrypted settings store over a preference substrate.
///
/// Cloning is cheap; clones share the substrate and cipher.
pub struct SecureSettingsStore<S, C> {
    storage: Arc<S>,
    cipher: Arc<C>,
    config: Arc<SecureStoreConfig>,
}

impl<S, C> Clone for SecureSettingsStore<S, C> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            cipher: self.cipher.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, C> std::fmt::Debug for SecureSettingsStore<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureSettingsStore")
            .field("slot_key", &self.config.slot_key)
            .field("retained_keys", &self.config.retained_keys)
            .finish_non_exhaustive()
    }
}

impl<S, C> SecureSettingsStore<S, C>
where
    S: PreferenceStorageEffects + 'static,
    C: CipherEffects + 'static,
{
    /// Build a store over `storage`, encrypting with `cipher`.
    pub fn new(
        storage: Arc<S>,
        cipher: Arc<C>,
        config: SecureStoreConfig,
    ) -> Result<Self, SettingsError> {
        config.validate()?;
        Ok(Self {
            storage,
            cipher,
            config: Arc::new(config),
        })
    }

    /// Live view of the stored profile.
    ///
    /// Emits the current profile on subscription and again whenever the
    /// decoded value changes. Never fails: anything unreadable is observed as
    /// the default profile.
    pub fn observe_user_profile(&self) -> ProfileStream<UserProfile> {
        self.secure_stream(&self.config.slot_key)
    }

    /// Current profile, or the default when nothing readable is stored
    pub async fn user_profile(&self) -> UserProfile {
        self.observe_user_profile()
            .next()
            .await
            .unwrap_or_default()
    }

    /// Encrypt and commit `profile` to the slot.
    ///
    /// Encryption failure follows the configured `WriteFailurePolicy`.
    /// Resolves once the substrate has committed.
    pub async fn set_user_profile(&self, profile: &UserProfile) -> Result<(), SettingsError> {
        self.secure_edit(&self.config.slot_key, profile).await
    }

    /// Remove every substrate key not in the retained set.
    ///
    /// Keys are removed one commit at a time; a failed removal does not stop
    /// the rest. Returns how many keys this call actually removed; keys that
    /// vanished concurrently are not counted.
    pub async fn clear_all(&self) -> Result<usize, SettingsError> {
        let keys = self.storage.keys().await?;
        let mut removed = 0;
        let mut failed = Vec::new();

        for key in keys {
            if self.config.retained_keys.contains(&key) {
                debug!(%key, "Retaining preference");
                continue;
            }
            let target = key.clone();
            let present = Arc::new(AtomicBool::new(false));
            let seen = present.clone();
            let edit = self.storage.edit(mutation(move |prefs| {
                seen.store(prefs.remove(&target).is_some(), Ordering::SeqCst);
            }));
            match edit.await {
                Ok(_) if present.load(Ordering::SeqCst) => removed += 1,
                Ok(_) => debug!(%key, "Preference already gone"),
                Err(error) => {
                    warn!(%key, %error, "Failed to remove preference");
                    failed.push(key);
                }
            }
        }

        if failed.is_empty() {
            info!(removed, "Cleared settings");
            Ok(removed)
        } else {
            Err(SettingsError::PartialClear { removed, failed })
        }
    }

    /// Store configuration
    pub fn config(&self) -> &SecureStoreConfig {
        &self.config
    }

    /// Underlying substrate
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    fn secure_stream<T: SettingsRecord>(&self, key: &str) -> ProfileStream<T> {
        let cipher = self.cipher.clone();
        let storage = self.storage.clone();
        let key = key.to_owned();
        let records = self.storage.data().map(move |snapshot| {
            // The stream owns a handle so the substrate outlives every store clone
            let _substrate = &storage;
            let prefs = recover_snapshot(snapshot);
            let plaintext = decrypt_or_empty(cipher.as_ref(), prefs.get(&key));
            decode_or_default::<T>(&plaintext)
        });
        distinct_until_changed(records).boxed()
    }

    async fn secure_edit<T>(&self, key: &str, value: &T) -> Result<(), SettingsError>
    where
        T: Serialize + Sync,
    {
        let plaintext = encode_record(value)?;
        let ciphertext =
            seal_for_write(self.cipher.as_ref(), &plaintext, self.config.write_failure)?;
        let slot = key.to_owned();
        self.storage
            .edit(mutation(move |prefs| {
                prefs.insert(slot, ciphertext);
            }))
            .await?;
        debug!(%key, "Committed encrypted slot");
        Ok(())
    }
}

impl SecureSettingsStore<FilesystemPreferenceHandler, ChaChaCipherHandler> {
    /// Open a store backed by the JSON document at `path`, encrypted with
    /// ChaCha20-Poly1305 under `key`.
    pub async fn open_filesystem(
        path: impl Into<PathBuf>,
        key: CipherKey,
        config: SecureStoreConfig,
    ) -> Result<Self, SettingsError> {
        config.validate()?;
        let storage = FilesystemPreferenceHandler::open(path, config.filesystem.clone()).await?;
        Self::new(
            Arc::new(storage),
            Arc::new(ChaChaCipherHandler::new(key)),
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_effects::MemoryPreferenceHandler;
    use pulse_testkit::TransparentCipher;

    fn store() -> SecureSettingsStore<MemoryPreferenceHandler, TransparentCipher> {
        SecureSettingsStore::new(
            Arc::new(MemoryPreferenceHandler::new()),
            Arc::new(TransparentCipher),
            SecureStoreConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_reads_default() {
        assert_eq!(store().user_profile().await, UserProfile::default());
    }

    #[tokio::test]
    async fn test_slot_holds_ciphertext() {
        let store = store();
        store.set_user_profile(&UserProfile::named("Ada")).await.unwrap();

        let snapshot = store.storage().snapshot().await.unwrap();
        assert_eq!(
            snapshot.get(crate::DEFAULT_SLOT_KEY),
            Some(r#"sealed:{"name":"Ada"}"#)
        );
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = SecureSettingsStore::new(
            Arc::new(MemoryPreferenceHandler::new()),
            Arc::new(TransparentCipher),
            SecureStoreConfig::new().with_slot_key(""),
        );
        assert!(matches!(result, Err(SettingsError::Config { .. })));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = store();
        let other = store.clone();
        store.set_user_profile(&UserProfile::named("Ada")).await.unwrap();
        assert_eq!(other.user_profile().await, UserProfile::named("Ada"));
    }
}
