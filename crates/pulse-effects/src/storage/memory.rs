//! In-memory preference substrate

use async_trait::async_trait;
use pulse_core::{
    PreferenceStorageEffects, Preferences, PreferencesMutation, PreferencesStream, StorageError,
};

use super::cell::PreferenceCell;

/// Process-local preference substrate.
///
/// Commits are visible to every subscriber of this instance and vanish with
/// it. Useful for tests and for hosts that persist elsewhere.
#[derive(Debug)]
pub struct MemoryPreferenceHandler {
    cell: PreferenceCell,
}

impl MemoryPreferenceHandler {
    /// Create an empty substrate
    pub fn new() -> Self {
        Self::with_data(Preferences::new())
    }

    /// Create a substrate seeded with `data`
    pub fn with_data(data: Preferences) -> Self {
        Self {
            cell: PreferenceCell::new(Ok(data)),
        }
    }
}

impl Default for MemoryPreferenceHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreferenceStorageEffects for MemoryPreferenceHandler {
    fn data(&self) -> PreferencesStream {
        self.cell.subscribe()
    }

    async fn edit(&self, mutation: PreferencesMutation) -> Result<Preferences, StorageError> {
        self.cell
            .commit(mutation, |_| futures::future::ready(Ok(())))
            .await
    }
}
