use std::collections::HashMap;

use anyhow::Result;
use parking_lot::Mutex;

use super::CredentialStorage;

/// Process-local storage. Values disappear with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_keys_are_independent() {
        let storage = MemoryStorage::new();
        storage.set("token", "public").expect("set");
        storage.set("admin-auth-storage", "{}").expect("set");

        storage.remove("token").expect("remove");
        assert_eq!(storage.get("token").expect("get"), None);
        assert_eq!(storage.get("admin-auth-storage").expect("get").as_deref(), Some("{}"));

        // Removing twice is fine
        storage.remove("token").expect("second remove");
    }
}
