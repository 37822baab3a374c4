//! Read and write stages of the secure slot
//!
//! Reading a slot is `recover_snapshot`, then `decrypt_or_empty`, then
//! `decode_or_default`, then `distinct_until_changed`. Each stage is total:
//! failures are logged and replaced by the neutral value of the next stage,
//! so the observed stream only ever carries records.

use futures::future;
use futures::{Stream, StreamExt};
use pulse_core::{CipherEffects, EncryptionError, Preferences, StorageError};
use tracing::{debug, warn};

use crate::codec::{decode_record, SettingsRecord};
use crate::config::WriteFailurePolicy;

/// Replace an unreadable snapshot with an empty one.
pub fn recover_snapshot(snapshot: Result<Preferences, StorageError>) -> Preferences {
    snapshot.unwrap_or_else(|error| {
        warn!(%error, "Preference snapshot unreadable, continuing with empty snapshot");
        Preferences::new()
    })
}

/// Decrypt the slot value, yielding empty text when it is absent, empty or
/// undecryptable.
pub fn decrypt_or_empty<C>(cipher: &C, ciphertext: Option<&str>) -> String
where
    C: CipherEffects + ?Sized,
{
    match ciphertext {
        None => String::new(),
        Some("") => {
            debug!("Slot holds an empty placeholder");
            String::new()
        }
        Some(ciphertext) => cipher.decrypt(ciphertext).unwrap_or_else(|error| {
            warn!(%error, "Slot ciphertext could not be decrypted, treating as empty");
            String::new()
        }),
    }
}

/// Decode plaintext into a record, yielding the default for empty or
/// malformed text.
pub fn decode_or_default<T: SettingsRecord>(plaintext: &str) -> T {
    if plaintext.is_empty() {
        return T::default();
    }
    decode_record(plaintext).unwrap_or_else(|error| {
        warn!(%error, "Slot plaintext is not a valid record, using default");
        T::default()
    })
}

/// Drop items equal to the previously emitted one.
pub fn distinct_until_changed<S>(stream: S) -> impl Stream<Item = S::Item>
where
    S: Stream,
    S::Item: PartialEq + Clone,
{
    let mut last: Option<S::Item> = None;
    stream.filter_map(move |item| {
        let changed = last.as_ref() != Some(&item);
        if changed {
            last = Some(item.clone());
        }
        future::ready(changed.then_some(item))
    })
}

/// Encrypt plaintext for the slot, applying `policy` when encryption fails.
pub fn seal_for_write<C>(
    cipher: &C,
    plaintext: &str,
    policy: WriteFailurePolicy,
) -> Result<String, EncryptionError>
where
    C: CipherEffects + ?Sized,
{
    match cipher.encrypt(plaintext) {
        Ok(ciphertext) => Ok(ciphertext),
        Err(error) => match policy {
            WriteFailurePolicy::PersistEmpty => {
                warn!(%error, "Encryption failed, persisting empty placeholder");
                Ok(String::new())
            }
            WriteFailurePolicy::Abort => {
                warn!(%error, "Encryption failed, aborting write");
                Err(error)
            }
        },
    }
}
