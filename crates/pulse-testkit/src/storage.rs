//! Preference substrate with fault injection
//!
//! Behaves like the in-memory substrate (serialized edits, watch-based change
//! stream) and adds switches for the failures a real engine can produce.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use pulse_core::{
    PreferenceStorageEffects, Preferences, PreferencesMutation, PreferencesStream, StorageError,
};
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;

/// Memory-backed substrate whose reads and commits can be made to fail.
#[derive(Debug)]
pub struct FaultyPreferenceStorage {
    /// Committed snapshot; the lock doubles as the single-writer guard
    committed: Mutex<Preferences>,
    /// What subscribers currently see
    state: watch::Sender<Result<Preferences, StorageError>>,
    /// Sticky commit failure
    edit_failure: StdMutex<Option<StorageError>>,
    /// Keys whose removal is refused
    protected_keys: StdMutex<BTreeSet<String>>,
    /// Per-call delays consumed in call order, applied before the commit
    edit_delays: StdMutex<VecDeque<Duration>>,
    /// Number of commits that changed the snapshot
    commits: AtomicUsize,
}

impl FaultyPreferenceStorage {
    /// Create an empty substrate
    pub fn new() -> Self {
        Self::with_data(Preferences::new())
    }

    /// Create a substrate seeded with `data`
    pub fn with_data(data: Preferences) -> Self {
        let (state, _initial_rx) = watch::channel(Ok(data.clone()));
        Self {
            committed: Mutex::new(data),
            state,
            edit_failure: StdMutex::new(None),
            protected_keys: StdMutex::new(BTreeSet::new()),
            edit_delays: StdMutex::new(VecDeque::new()),
            commits: AtomicUsize::new(0),
        }
    }

    /// Publish a read failure to every subscriber.
    ///
    /// The committed snapshot is untouched; the next commit or `republish`
    /// makes it visible again.
    pub fn inject_read_error(&self, error: StorageError) {
        tracing::debug!(%error, "Injecting snapshot read error");
        self.state.send_replace(Err(error));
    }

    /// Publish the committed snapshot again after an injected read error
    pub async fn republish(&self) {
        let committed = self.committed.lock().await;
        self.state.send_replace(Ok(committed.clone()));
    }

    /// Make every commit fail with `error` until cleared with `None`
    pub fn fail_edits(&self, error: Option<StorageError>) {
        if let Ok(mut failure) = self.edit_failure.lock() {
            *failure = error;
        }
    }

    /// Refuse any commit that would remove `key`
    pub fn protect_key(&self, key: impl Into<String>) {
        if let Ok(mut keys) = self.protected_keys.lock() {
            keys.insert(key.into());
        }
    }

    /// Delay the next not-yet-started `edit` call by `delay` before it commits
    pub fn delay_next_edit(&self, delay: Duration) {
        if let Ok(mut delays) = self.edit_delays.lock() {
            delays.push_back(delay);
        }
    }

    /// Write `value` under `key` directly, as another process would.
    pub async fn put_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut committed = self.committed.lock().await;
        committed.insert(key, value);
        self.state.send_replace(Ok(committed.clone()));
    }

    /// The committed snapshot, regardless of injected read errors
    pub async fn committed(&self) -> Preferences {
        self.committed.lock().await.clone()
    }

    /// Number of commits that changed the snapshot
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn next_delay(&self) -> Option<Duration> {
        self.edit_delays.lock().ok().and_then(|mut d| d.pop_front())
    }

    fn armed_failure(&self) -> Option<StorageError> {
        self.edit_failure.lock().ok().and_then(|f| f.clone())
    }

    fn removed_protected_key(&self, before: &Preferences, after: &Preferences) -> Option<String> {
        let keys = self.protected_keys.lock().ok()?;
        keys.iter()
            .find(|k| before.contains_key(k) && !after.contains_key(k))
            .cloned()
    }
}

impl Default for FaultyPreferenceStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreferenceStorageEffects for FaultyPreferenceStorage {
    fn data(&self) -> PreferencesStream {
        Box::pin(WatchStream::new(self.state.subscribe()))
    }

    async fn edit(&self, mutation: PreferencesMutation) -> Result<Preferences, StorageError> {
        if let Some(delay) = self.next_delay() {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.armed_failure() {
            return Err(error);
        }

        let mut committed = self.committed.lock().await;
        let mut next = committed.clone();
        mutation(&mut next);

        if let Some(key) = self.removed_protected_key(&committed, &next) {
            return Err(StorageError::WriteFailed(format!("removal of {key} refused")));
        }
        if next == *committed {
            return Ok(next);
        }

        *committed = next.clone();
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(Ok(next.clone()));
        Ok(next)
    }
}
