//! Property tests for the secure settings store.

use std::sync::Arc;

use proptest::prelude::*;
use pulse_core::{mutation, PreferenceStorageEffects};
use pulse_effects::{ChaChaCipherHandler, CipherKey, MemoryPreferenceHandler};
use pulse_store::{SecureSettingsStore, SecureStoreConfig, UserProfile, DEFAULT_SLOT_KEY};

fn field() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-zA-Z0-9 @._\\-\u{e9}\u{4e2d}]{0,24}")
}

fn any_profile() -> impl Strategy<Value = UserProfile> {
    (field(), field(), field(), field(), field(), field(), field()).prop_map(
        |(id, name, email, phone, avatar_url, access_token, refresh_token)| UserProfile {
            id,
            name,
            email,
            phone,
            avatar_url,
            access_token,
            refresh_token,
        },
    )
}

fn memory_store() -> (
    SecureSettingsStore<MemoryPreferenceHandler, ChaChaCipherHandler>,
    Arc<MemoryPreferenceHandler>,
) {
    let storage = Arc::new(MemoryPreferenceHandler::new());
    let store = SecureSettingsStore::new(
        storage.clone(),
        Arc::new(ChaChaCipherHandler::new(CipherKey::generate())),
        SecureStoreConfig::default(),
    )
    .unwrap();
    (store, storage)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_written_profile_is_read_back(profile in any_profile()) {
        let observed = tokio_test::block_on(async {
            let (store, _) = memory_store();
            store.set_user_profile(&profile).await.unwrap();
            store.user_profile().await
        });
        prop_assert_eq!(observed, profile);
    }

    #[test]
    fn prop_garbage_slot_reads_default(bytes in proptest::collection::vec(any::<u8>(), 0..96)) {
        let garbage = String::from_utf8_lossy(&bytes).into_owned();
        let observed = tokio_test::block_on(async {
            let (store, storage) = memory_store();
            storage
                .edit(mutation(move |prefs| {
                    prefs.insert(DEFAULT_SLOT_KEY, garbage);
                }))
                .await
                .unwrap();
            store.user_profile().await
        });
        prop_assert_eq!(observed, UserProfile::default());
    }

    #[test]
    fn prop_base64_noise_reads_default(noise in "[A-Za-z0-9+/]{0,120}={0,2}") {
        let observed = tokio_test::block_on(async {
            let (store, storage) = memory_store();
            storage
                .edit(mutation(move |prefs| {
                    prefs.insert(DEFAULT_SLOT_KEY, noise);
                }))
                .await
                .unwrap();
            store.user_profile().await
        });
        prop_assert_eq!(observed, UserProfile::default());
    }
}
