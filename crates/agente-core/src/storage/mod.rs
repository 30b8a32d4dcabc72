//! Durable storage for the persisted session record.
//!
//! The record is two string entries, `token` and `user`, mirroring what the
//! web dashboard keeps in browser local storage. Backends:
//! - `FileStorage`: a JSON object on disk in the cache directory
//! - `KeyringStorage`: one OS keychain entry per key
//! - `MemoryStorage`: process-local map, for tests and embedders

pub mod file;
pub mod keychain;
pub mod memory;

use anyhow::Result;

pub use file::FileStorage;
pub use keychain::KeyringStorage;
pub use memory::MemoryStorage;

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Key holding the JSON-serialized user record.
pub const USER_KEY: &str = "user";

/// A durable string key-value store.
///
/// Removing a key that does not exist is not an error.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
