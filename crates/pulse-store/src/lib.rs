//! Pulse Store - Secure Settings Store
//!
//! One encrypted slot holding the user profile, layered over any
//! `PreferenceStorageEffects` substrate and any `CipherEffects` cipher.
//!
//! - Reads are a live stream that never fails: unreadable snapshots,
//!   undecryptable ciphertext and malformed encodings all surface as the
//!   default profile, and repeated values are suppressed.
//! - Writes encrypt before committing; what happens when encryption fails is
//!   the explicit `WriteFailurePolicy`.
//! - `clear_all` removes every substrate key outside the retained set.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = SecureStoreConfig::load_from_file(Path::new("pulse.toml"))?;
//! let key = config.cipher_key()?;
//! let store = SecureSettingsStore::open_filesystem("data/settings.json", key, config).await?;
//!
//! store.set_user_profile(&UserProfile::named("Ada")).await?;
//! let mut profiles = store.observe_user_profile();
//! while let Some(profile) = profiles.next().await {
//!     render(profile);
//! }
//! ```

#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod profile;
pub mod store;

pub use codec::SettingsRecord;
pub use config::{SecureStoreConfig, WriteFailurePolicy, DEFAULT_SLOT_KEY};
pub use errors::SettingsError;
pub use profile::UserProfile;
pub use store::{ProfileStream, SecureSettingsStore};
