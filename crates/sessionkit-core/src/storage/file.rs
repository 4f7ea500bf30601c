use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{Storage, StorageError};

/// Storage file name in the data directory
pub const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageFile {
    entries: BTreeMap<String, String>,
    updated_at: DateTime<Utc>,
}

impl Default for StorageFile {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Storage backed by a single JSON file.
///
/// Writes go to a temporary file that is renamed over the old one, so a
/// crash never leaves a half-written file. On Unix the file is readable
/// by its owner only. A file that cannot be parsed is discarded on the
/// next write instead of blocking it.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl FileStorage {
    /// Storage at `<data_dir>/storage.json`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::at_path(data_dir.as_ref().join(STORAGE_FILE))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the file was last written, if it exists
    pub fn last_updated(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        Ok(self.load()?.map(|file| file.updated_at))
    }

    fn load(&self) -> Result<Option<StorageFile>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Load for a write; a corrupt file reads as empty
    fn load_for_write(&self) -> Result<Option<StorageFile>, StorageError> {
        match self.load() {
            Err(StorageError::Serialization(e)) => {
                warn!(path = ?self.path, error = %e, "Discarding corrupt storage file");
                Ok(None)
            }
            other => other,
        }
    }

    fn write(&self, mut file: StorageFile) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        file.updated_at = Utc::now();
        let contents = serde_json::to_string_pretty(&file)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = ?self.path, keys = file.entries.len(), "Storage file written");
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(self.load()?.and_then(|mut file| file.entries.remove(key)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Unavailable)?;
        let mut file = self.load_for_write()?.unwrap_or_default();
        file.entries.insert(key.to_string(), value.to_string());
        self.write(file)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Unavailable)?;
        let mut file = match self.load() {
            Ok(Some(file)) => file,
            Ok(None) => return Ok(()),
            Err(StorageError::Serialization(e)) => {
                warn!(path = ?self.path, error = %e, "Removing corrupt storage file");
                std::fs::remove_file(&self.path)?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if file.entries.remove(key).is_some() {
            self.write(file)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::CredentialStore;
    use crate::models::CredentialPair;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.get("accessToken").unwrap(), None);
        assert!(storage.last_updated().unwrap().is_none());
        assert!(storage.remove("accessToken").is_ok());
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::new(dir.path()).set("accessToken", "A").unwrap();

        let reopened = FileStorage::new(dir.path());
        assert_eq!(reopened.get("accessToken").unwrap().as_deref(), Some("A"));
        assert!(reopened.last_updated().unwrap().is_some());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("deeper"));
        storage.set("k", "v").unwrap();
        assert!(storage.path().exists());
    }

    #[test]
    fn test_remove_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        storage.remove("a").unwrap();

        assert_eq!(storage.get("a").unwrap(), None);
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_corrupt_file_is_replaced_on_set() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        std::fs::write(storage.path(), r#"{"entries":{"accessToken":"A""#).unwrap();

        storage.set("accessToken", "NEW").unwrap();
        assert_eq!(storage.get("accessToken").unwrap().as_deref(), Some("NEW"));
    }

    #[test]
    fn test_corrupt_file_is_deleted_on_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        std::fs::write(storage.path(), "{\"entries\":").unwrap();

        storage.remove("accessToken").unwrap();
        assert!(!storage.path().exists());
        assert_eq!(storage.get("accessToken").unwrap(), None);
    }

    #[test]
    fn test_credential_store_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()));
        std::fs::write(storage.path(), r#"{"entries":{"accessToken":"A""#).unwrap();

        let store = CredentialStore::new(storage);
        store.clear();
        store.save(&CredentialPair::new("NEW", "R"));

        assert_eq!(store.read_access().as_deref(), Some("NEW"));
        assert_eq!(store.read_refresh().as_deref(), Some("R"));
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(STORAGE_FILE)]);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set("accessToken", "A").unwrap();

        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        std::fs::write(storage.path(), "not json").unwrap();
        assert!(matches!(
            storage.get("k"),
            Err(StorageError::Serialization(_))
        ));
    }
}
