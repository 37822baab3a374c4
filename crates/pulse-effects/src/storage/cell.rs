//! Committed-snapshot cell shared by the substrate handlers

use std::future::Future;

use pulse_core::{Preferences, PreferencesMutation, PreferencesStream, StorageError};
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;

/// Latest committed snapshot, or the reason it cannot be read.
pub(crate) type SnapshotState = Result<Preferences, StorageError>;

/// Holds the committed snapshot and serializes writers.
///
/// Subscribers receive the current state immediately and every later state
/// published through `commit` or `replace`.
#[derive(Debug)]
pub(crate) struct PreferenceCell {
    /// Single-writer guard; held for the whole read-modify-persist-publish cycle
    writer: Mutex<()>,
    /// Publication channel for committed states
    state: watch::Sender<SnapshotState>,
}

impl PreferenceCell {
    pub(crate) fn new(initial: SnapshotState) -> Self {
        let (state, _initial_rx) = watch::channel(initial);
        Self {
            writer: Mutex::new(()),
            state,
        }
    }

    pub(crate) fn subscribe(&self) -> PreferencesStream {
        Box::pin(WatchStream::new(self.state.subscribe()))
    }

    pub(crate) fn current(&self) -> SnapshotState {
        self.state.borrow().clone()
    }

    /// Apply `mutation`, persist the result, then publish it.
    ///
    /// Nothing is persisted or published when the mutation is a no-op or when
    /// `persist` fails.
    pub(crate) async fn commit<F, Fut>(
        &self,
        mutation: PreferencesMutation,
        persist: F,
    ) -> Result<Preferences, StorageError>
    where
        F: FnOnce(Preferences) -> Fut,
        Fut: Future<Output = Result<(), StorageError>>,
    {
        let _guard = self.writer.lock().await;
        let current = self.current()?;

        let mut next = current.clone();
        mutation(&mut next);
        if next == current {
            return Ok(next);
        }

        persist(next.clone()).await?;
        self.state.send_replace(Ok(next.clone()));
        Ok(next)
    }

    /// Run `load` under the writer guard and publish whatever it returns.
    pub(crate) async fn replace<F, Fut>(&self, load: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SnapshotState>,
    {
        let _guard = self.writer.lock().await;
        let next = load().await;
        self.state.send_replace(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pulse_core::mutation;

    fn no_persist(_: Preferences) -> futures::future::Ready<Result<(), StorageError>> {
        futures::future::ready(Ok(()))
    }

    #[tokio::test]
    async fn test_subscriber_sees_current_then_commits() {
        let cell = PreferenceCell::new(Ok(Preferences::new()));
        let mut stream = cell.subscribe();

        assert_eq!(stream.next().await, Some(Ok(Preferences::new())));

        cell.commit(mutation(|p| drop(p.insert("k", "v"))), no_persist)
            .await
            .unwrap();

        let next = stream.next().await.unwrap().unwrap();
        assert_eq!(next.get("k"), Some("v"));
    }

    #[tokio::test]
    async fn test_failed_persist_publishes_nothing() {
        let cell = PreferenceCell::new(Ok(Preferences::new()));

        let result = cell
            .commit(mutation(|p| drop(p.insert("k", "v"))), |_| async {
                Err(StorageError::WriteFailed("disk full".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(cell.current(), Ok(Preferences::new()));
    }

    #[tokio::test]
    async fn test_commit_on_unreadable_state_fails() {
        let cell = PreferenceCell::new(Err(StorageError::corrupted("bad json")));

        let result = cell.commit(mutation(|_| {}), no_persist).await;
        assert_eq!(result, Err(StorageError::corrupted("bad json")));
    }
}
