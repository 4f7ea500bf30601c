//! Key-value persistence for session credentials.
//!
//! This module provides the `Storage` trait and its backends:
//! - `MemoryStorage`: process-local map, used in tests and ephemeral sessions
//! - `FileStorage`: JSON file in the user's data directory
//! - `KeyringStorage`: OS keychain entries
//! - `UnavailableStorage`: a runtime with no usable storage
//!
//! Backends store plain strings under fixed keys, in the manner of a
//! browser's local storage.

pub mod file;
pub mod keyring;
pub mod memory;

use thiserror::Error;

pub use self::file::FileStorage;
pub use self::keyring::KeyringStorage;
pub use self::memory::MemoryStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Keyring error: {0}")]
    Keyring(#[from] ::keyring::Error),

    #[error("Storage unavailable")]
    Unavailable,
}

/// A string key-value store scoped to one client context.
///
/// Removing a key that does not exist succeeds.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage for runtimes where persistence is not available.
/// Every operation fails with `StorageError::Unavailable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStorage;

impl Storage for UnavailableStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}
