//! Secure store over the filesystem substrate and the ChaCha20-Poly1305
//! cipher.

use std::path::Path;

use assert_matches::assert_matches;
use pulse_effects::{CipherKey, CorruptionPolicy, FilesystemPreferenceConfig, KeySource};
use pulse_store::{SecureSettingsStore, SecureStoreConfig, SettingsError, UserProfile};
use pulse_testkit::init_tracing;

fn profile() -> UserProfile {
    UserProfile {
        name: Some("Ada".into()),
        access_token: Some("tok-analytical-engine".into()),
        ..UserProfile::default()
    }
}

async fn open(
    path: &Path,
    key: &CipherKey,
    config: SecureStoreConfig,
) -> Result<
    SecureSettingsStore<pulse_effects::FilesystemPreferenceHandler, pulse_effects::ChaChaCipherHandler>,
    SettingsError,
> {
    SecureSettingsStore::open_filesystem(path, key.clone(), config).await
}

#[tokio::test]
async fn test_profile_survives_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings").join("prefs.json");
    let key = CipherKey::generate();

    let store = open(&path, &key, SecureStoreConfig::default()).await.unwrap();
    store.set_user_profile(&profile()).await.unwrap();
    drop(store);

    let document = std::fs::read_to_string(&path).unwrap();
    assert!(!document.contains("Ada"));
    assert!(!document.contains("tok-analytical-engine"));

    let reopened = open(&path, &key, SecureStoreConfig::default()).await.unwrap();
    assert_eq!(reopened.user_profile().await, profile());
}

#[tokio::test]
async fn test_reopen_with_other_key_reads_default() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");

    let store = open(&path, &CipherKey::generate(), SecureStoreConfig::default())
        .await
        .unwrap();
    store.set_user_profile(&profile()).await.unwrap();

    let other = open(&path, &CipherKey::generate(), SecureStoreConfig::default())
        .await
        .unwrap();
    assert_eq!(other.user_profile().await, UserProfile::default());
}

#[tokio::test]
async fn test_clear_all_keeps_retained_key_on_disk() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");
    std::fs::write(&path, r#"{"onboarding_seen":"true","locale":"en"}"#).unwrap();
    let key = CipherKey::generate();
    let config = SecureStoreConfig::default().with_retained_key("onboarding_seen");

    let store = open(&path, &key, config.clone()).await.unwrap();
    store.set_user_profile(&profile()).await.unwrap();
    assert_eq!(store.clear_all().await.unwrap(), 2);

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document, serde_json::json!({ "onboarding_seen": "true" }));

    let reopened = open(&path, &key, config).await.unwrap();
    assert_eq!(reopened.user_profile().await, UserProfile::default());
}

#[tokio::test]
async fn test_corrupt_document() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");
    std::fs::write(&path, "{ not json").unwrap();
    let key = CipherKey::generate();

    // Reads still succeed; commits are refused while the document is corrupt
    let strict = open(&path, &key, SecureStoreConfig::default()).await.unwrap();
    assert_eq!(strict.user_profile().await, UserProfile::default());
    assert_matches!(
        strict.set_user_profile(&profile()).await,
        Err(SettingsError::Storage(_))
    );

    let config = SecureStoreConfig::default().with_filesystem(
        FilesystemPreferenceConfig::new().with_corruption_policy(CorruptionPolicy::ReplaceWithEmpty),
    );
    let lenient = open(&path, &key, config).await.unwrap();
    lenient.set_user_profile(&profile()).await.unwrap();
    assert_eq!(lenient.user_profile().await, profile());
}

#[tokio::test]
async fn test_open_from_config_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let key = CipherKey::generate();
    let config_path = dir.path().join("pulse.toml");
    std::fs::write(
        &config_path,
        format!(
            "retained_keys = [\"locale\"]\n\n[key]\nsource = \"base64\"\nkey = \"{}\"\n",
            key.to_base64()
        ),
    )
    .unwrap();

    let config = SecureStoreConfig::load_from_file(&config_path).unwrap();
    assert_eq!(
        config.key,
        Some(KeySource::Base64 {
            key: key.to_base64()
        })
    );
    let resolved = config.cipher_key().unwrap();
    let path = dir.path().join("prefs.json");

    let store = open(&path, &resolved, config).await.unwrap();
    store.set_user_profile(&profile()).await.unwrap();

    let same_key = open(&path, &key, SecureStoreConfig::default()).await.unwrap();
    assert_eq!(same_key.user_profile().await, profile());
}
