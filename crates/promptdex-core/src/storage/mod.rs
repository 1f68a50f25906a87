//! Persisted credential storage.
//!
//! The session store persists exactly one value per application through a
//! [`CredentialStorage`] backend:
//!
//! - `FileStorage`: one file per key under the cache directory
//! - `KeyringStorage`: the OS keychain via `keyring`
//! - `MemoryStorage`: process-local, for tests and throwaway sessions
//!
//! Backends are plain key/value stores; the layout of the value (raw
//! credential or JSON envelope) is decided by the session store.

pub mod file;
pub mod keychain;
pub mod memory;

use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use self::file::FileStorage;
pub use self::keychain::KeyringStorage;
pub use self::memory::MemoryStorage;

/// Durable key/value storage for credential material.
pub trait CredentialStorage: Send + Sync {
    /// Read a value, `None` when nothing is stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl StorageBackend {
    /// Build the backend. `dir` is only used by file storage.
    pub fn open(&self, dir: &Path) -> Result<Box<dyn CredentialStorage>> {
        Ok(match self {
            StorageBackend::File => Box::new(FileStorage::new(dir.to_path_buf())),
            StorageBackend::Keyring => Box::new(KeyringStorage::new()),
            StorageBackend::Memory => Box::new(MemoryStorage::new()),
        })
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" | "keychain" => Ok(StorageBackend::Keyring),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        }
    }
}
