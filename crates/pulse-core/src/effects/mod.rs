//! Effect interfaces
//!
//! Traits only. Production handlers live in `pulse-effects`, test doubles in
//! `pulse-testkit`.

pub mod cipher;
pub mod storage;

pub use cipher::CipherEffects;
pub use storage::{
    mutation, PreferenceStorageEffects, Preferences, PreferencesMutation, PreferencesStream,
};
