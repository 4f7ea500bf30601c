use std::collections::HashMap;
use std::sync::Mutex;

use keyring::Entry;

use super::{Storage, StorageError};

/// Default keychain service name
pub const SERVICE_NAME: &str = "sessionkit";

/// Storage backed by the OS keychain, one entry per key.
///
/// Entries are created once per key and reused, so every operation on a
/// key goes through the same credential handle.
pub struct KeyringStorage {
    service: String,
    entries: Mutex<HashMap<String, Entry>>,
}

impl KeyringStorage {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn with_entry<T>(
        &self,
        key: &str,
        op: impl FnOnce(&Entry) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Unavailable)?;
        if !entries.contains_key(key) {
            let entry = Entry::new(&self.service, key)?;
            entries.insert(key.to_string(), entry);
        }
        match entries.get(key) {
            Some(entry) => op(entry),
            None => Err(StorageError::Unavailable),
        }
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_entry(key, |entry| Ok(entry.set_password(value)?))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::CredentialStore;
    use crate::models::CredentialPair;

    // The in-memory mock store keeps no state between `Entry::new` calls,
    // so these tests only pass when entries are reused.
    fn mock_storage(service: &str) -> KeyringStorage {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        KeyringStorage::with_service(service)
    }

    #[test]
    fn test_set_then_get_returns_value() {
        let storage = mock_storage("sessionkit-test-roundtrip");
        storage.set("accessToken", "A").unwrap();
        assert_eq!(storage.get("accessToken").unwrap().as_deref(), Some("A"));

        storage.set("accessToken", "B").unwrap();
        assert_eq!(storage.get("accessToken").unwrap().as_deref(), Some("B"));
    }

    #[test]
    fn test_remove_then_get_is_none() {
        let storage = mock_storage("sessionkit-test-remove");
        assert_eq!(storage.get("refreshToken").unwrap(), None);

        storage.set("refreshToken", "R").unwrap();
        storage.remove("refreshToken").unwrap();
        assert_eq!(storage.get("refreshToken").unwrap(), None);
        assert!(storage.remove("refreshToken").is_ok());
    }

    #[test]
    fn test_credential_store_on_keyring() {
        let store = CredentialStore::new(Arc::new(mock_storage("sessionkit-test-store")));
        store.save(&CredentialPair::new("A", "B"));
        assert_eq!(store.read_access().as_deref(), Some("A"));
        assert_eq!(store.read_refresh().as_deref(), Some("B"));

        store.clear();
        assert!(!store.has_session());
    }
}
