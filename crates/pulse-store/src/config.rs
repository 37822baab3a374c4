//! Settings store configuration
//!
//! Loaded from TOML, overridden by `PULSE_STORE_*` environment variables and
//! validated before a store is built.
//!
//! ```toml
//! slot_key = "pref_user_data"
//! retained_keys = ["onboarding_seen"]
//! write_failure = "persist_empty"
//!
//! [filesystem]
//! corruption = "replace_with_empty"
//!
//! [key]
//! source = "env"
//! var = "PULSE_SETTINGS_KEY"
//! ```

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use pulse_effects::{CipherKey, FilesystemPreferenceConfig, KeySource};
use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;

/// Substrate key under which the encrypted user profile is kept
pub const DEFAULT_SLOT_KEY: &str = "pref_user_data";

const ENV_SLOT_KEY: &str = "PULSE_STORE_SLOT_KEY";
const ENV_RETAINED_KEYS: &str = "PULSE_STORE_RETAINED_KEYS";
const ENV_WRITE_FAILURE: &str = "PULSE_STORE_WRITE_FAILURE";
const ENV_KEY_VAR: &str = "PULSE_STORE_KEY_ENV";

/// What `set_user_profile` commits when encryption fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFailurePolicy {
    /// Commit an empty ciphertext; readers then see the default profile
    #[default]
    PersistEmpty,
    /// Commit nothing and return the encryption error
    Abort,
}

impl FromStr for WriteFailurePolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "persist_empty" => Ok(Self::PersistEmpty),
            "abort" => Ok(Self::Abort),
            other => Err(SettingsError::config(format!(
                "Unknown write failure policy: {other}"
            ))),
        }
    }
}

/// Settings store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecureStoreConfig {
    /// Substrate key of the encrypted profile slot
    pub slot_key: String,
    /// Keys `clear_all` leaves in place
    pub retained_keys: BTreeSet<String>,
    /// Behavior when encryption fails on write
    pub write_failure: WriteFailurePolicy,
    /// Filesystem substrate settings, used by `open_filesystem`
    pub filesystem: FilesystemPreferenceConfig,
    /// Where the cipher key comes from
    pub key: Option<KeySource>,
}

impl Default for SecureStoreConfig {
    fn default() -> Self {
        Self {
            slot_key: DEFAULT_SLOT_KEY.to_string(),
            retained_keys: BTreeSet::new(),
            write_failure: WriteFailurePolicy::default(),
            filesystem: FilesystemPreferenceConfig::default(),
            key: None,
        }
    }
}

impl SecureStoreConfig {
    /// Create config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different slot key
    pub fn with_slot_key(mut self, key: impl Into<String>) -> Self {
        self.slot_key = key.into();
        self
    }

    /// Keep `key` across `clear_all`
    pub fn with_retained_key(mut self, key: impl Into<String>) -> Self {
        self.retained_keys.insert(key.into());
        self
    }

    /// Set the encryption failure policy
    pub fn with_write_failure(mut self, policy: WriteFailurePolicy) -> Self {
        self.write_failure = policy;
        self
    }

    /// Set the filesystem substrate settings
    pub fn with_filesystem(mut self, filesystem: FilesystemPreferenceConfig) -> Self {
        self.filesystem = filesystem;
        self
    }

    /// Set the key source
    pub fn with_key_source(mut self, source: KeySource) -> Self {
        self.key = Some(source);
        self
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        toml::from_str(text).map_err(|e| SettingsError::config(format!("Invalid TOML: {e}")))
    }

    /// Load configuration from a TOML file, apply environment overrides and
    /// validate the result.
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PULSE_STORE_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<(), SettingsError> {
        self.merge_with_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// `PULSE_STORE_RETAINED_KEYS` is comma-separated and replaces the
    /// configured set. `PULSE_STORE_KEY_ENV` names the variable holding a
    /// base64 key.
    pub fn merge_with_vars<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(slot_key) = lookup(ENV_SLOT_KEY) {
            self.slot_key = slot_key;
        }
        if let Some(keys) = lookup(ENV_RETAINED_KEYS) {
            self.retained_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(policy) = lookup(ENV_WRITE_FAILURE) {
            self.write_failure = policy.parse()?;
        }
        if let Some(var) = lookup(ENV_KEY_VAR) {
            self.key = Some(KeySource::Env { var });
        }
        Ok(())
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.slot_key.trim().is_empty() {
            return Err(SettingsError::config("slot_key must not be empty"));
        }
        if self.retained_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(SettingsError::config("retained_keys must not contain empty keys"));
        }
        Ok(())
    }

    /// Resolve the configured key source
    pub fn cipher_key(&self) -> Result<CipherKey, SettingsError> {
        let source = self
            .key
            .as_ref()
            .ok_or_else(|| SettingsError::config("no key source configured"))?;
        Ok(source.resolve()?)
    }
}
