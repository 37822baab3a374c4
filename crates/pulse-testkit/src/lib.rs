//! Pulse Testkit
//!
//! Test doubles for the `pulse-core` effect interfaces. Production handlers
//! live in `pulse-effects`; everything here exists to provoke the failure
//! paths the settings store must survive:
//!
//! - `FaultyPreferenceStorage`: read-error injection, failing or delayed
//!   commits, raw writes that bypass the store
//! - `FaultyCipher`: wraps a real cipher and fails on demand
//! - `TransparentCipher`: reversible, readable "encryption" for asserting on
//!   pipeline stages

#![forbid(unsafe_code)]

pub mod cipher;
pub mod storage;

pub use cipher::{FaultyCipher, TransparentCipher};
pub use storage::FaultyPreferenceStorage;

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
