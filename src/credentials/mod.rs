//! Credential Provider
//!
//! Loads the SSH private key used for outbound clones. The key is loaded
//! once at startup and shared read-only by every request as a [`KeyHandle`];
//! the key material itself never leaves the file, only its path is handed to
//! `ssh`.

pub mod error;
pub mod loader;

pub use error::{KeyLoadError, KeyResult};
pub use loader::{expand_tilde, load_key, KeyAlgorithm, KeyEncoding, KeyHandle};
