//! Preference substrate effect
//!
//! The minimal contract the settings store needs from a durable key-value
//! engine: a change stream of full snapshots, an atomic edit, and key
//! enumeration. Schema, file layout and durability guarantees belong to the
//! implementation.

use std::collections::BTreeMap;
use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;

/// A full snapshot of the substrate's key space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences {
    entries: BTreeMap<String, String>,
}

impl Preferences {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a value, returning it if it was present
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Preferences {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Change stream of substrate snapshots.
///
/// An `Err` item reports one unreadable snapshot; it does not end the stream.
pub type PreferencesStream = Pin<Box<dyn Stream<Item = Result<Preferences, StorageError>> + Send>>;

/// A transformation applied to the latest committed snapshot by `edit`.
pub type PreferencesMutation = Box<dyn FnOnce(&mut Preferences) + Send>;

/// Box a closure as a `PreferencesMutation`.
pub fn mutation<F>(f: F) -> PreferencesMutation
where
    F: FnOnce(&mut Preferences) + Send + 'static,
{
    Box::new(f)
}

/// Durable key-value substrate with change notification.
///
/// Implementations serialize `edit` calls on one instance: each mutation sees
/// the result of every edit committed before it.
#[async_trait]
pub trait PreferenceStorageEffects: Send + Sync {
    /// Subscribe to snapshots.
    ///
    /// The stream yields the current snapshot first, then one item per
    /// committed change. Slow subscribers may observe only the latest of
    /// several rapid commits.
    fn data(&self) -> PreferencesStream;

    /// Apply `mutation` to the latest snapshot and commit the result atomically.
    ///
    /// Returns the committed snapshot. A mutation that leaves the snapshot
    /// unchanged commits nothing and notifies nobody.
    async fn edit(&self, mutation: PreferencesMutation) -> Result<Preferences, StorageError>;

    /// Read the current snapshot once.
    async fn snapshot(&self) -> Result<Preferences, StorageError> {
        match self.data().next().await {
            Some(snapshot) => snapshot,
            None => Err(StorageError::ChangeStreamClosed),
        }
    }

    /// Enumerate the keys of the current snapshot.
    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.keys().map(str::to_owned).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fixed-sequence substrate for exercising the provided methods
    struct ScriptedStorage {
        items: Mutex<Vec<Result<Preferences, StorageError>>>,
    }

    #[async_trait]
    impl PreferenceStorageEffects for ScriptedStorage {
        fn data(&self) -> PreferencesStream {
            let items = self.items.lock().unwrap().clone();
            Box::pin(futures::stream::iter(items))
        }

        async fn edit(&self, mutation: PreferencesMutation) -> Result<Preferences, StorageError> {
            let mut items = self.items.lock().unwrap();
            let mut next = items.first().cloned().unwrap_or(Ok(Preferences::new()))?;
            mutation(&mut next);
            items.insert(0, Ok(next.clone()));
            Ok(next)
        }
    }

    #[test]
    fn test_preferences_basic_operations() {
        let mut prefs = Preferences::new();
        assert!(prefs.is_empty());

        assert_eq!(prefs.insert("theme", "dark"), None);
        assert_eq!(prefs.insert("theme", "light"), Some("dark".to_string()));
        prefs.insert("locale", "en");

        assert_eq!(prefs.get("theme"), Some("light"));
        assert_eq!(prefs.keys().collect::<Vec<_>>(), vec!["locale", "theme"]);
        assert_eq!(prefs.remove("locale"), Some("en".to_string()));
        assert!(!prefs.contains_key("locale"));
        assert_eq!(prefs.len(), 1);
    }

    #[test]
    fn test_preferences_serialize_as_plain_object() {
        let prefs: Preferences = [("a", "1"), ("b", "2")].into_iter().collect();
        let json = serde_json::to_string(&prefs).unwrap();
        assert_eq!(json, r#"{"a":"1","b":"2"}"#);
    }

    #[tokio::test]
    async fn test_snapshot_reads_first_item() {
        let first: Preferences = [("k", "v")].into_iter().collect();
        let storage = ScriptedStorage {
            items: Mutex::new(vec![Ok(first.clone()), Ok(Preferences::new())]),
        };

        assert_eq!(storage.snapshot().await.unwrap(), first);
        assert_eq!(storage.keys().await.unwrap(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_snapshot_of_empty_stream_is_an_error() {
        let storage = ScriptedStorage {
            items: Mutex::new(Vec::new()),
        };

        assert_eq!(
            storage.snapshot().await,
            Err(StorageError::ChangeStreamClosed)
        );
    }

    #[tokio::test]
    async fn test_keys_propagates_read_error() {
        let storage = ScriptedStorage {
            items: Mutex::new(vec![Err(StorageError::ReadFailed("offline".into()))]),
        };

        assert!(matches!(
            storage.keys().await,
            Err(StorageError::ReadFailed(_))
        ));
    }
}
