//! Cipher handlers
//!
//! `ChaChaCipherHandler` is the production encryption adapter. Its key is an
//! explicit `CipherKey` supplied at construction, resolved from a `KeySource`
//! when it comes from configuration.

pub mod chacha;
pub mod key;

pub use chacha::ChaChaCipherHandler;
pub use key::{CipherKey, KeySource, KEY_LEN};
