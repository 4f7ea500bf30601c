use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::CredentialPair;
use crate::storage::Storage;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Owner of the session's credential pair.
///
/// Storage failures never reach the caller: they are logged and the
/// operation degrades to a no-op. Cloning shares the same backend.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn Storage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Write both tokens, replacing any previous pair
    pub fn save(&self, pair: &CredentialPair) {
        if let Err(e) = self.storage.set(ACCESS_TOKEN_KEY, &pair.access_token) {
            warn!(error = %e, "Failed to store access token");
            return;
        }
        if let Err(e) = self.storage.set(REFRESH_TOKEN_KEY, &pair.refresh_token) {
            warn!(error = %e, "Failed to store refresh token, rolling back access token");
            if let Err(e) = self.storage.remove(ACCESS_TOKEN_KEY) {
                warn!(error = %e, "Failed to roll back access token");
            }
            return;
        }
        debug!("Credentials saved");
    }

    /// Get the stored access token, if any
    pub fn read_access(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    /// Get the stored refresh token, if any
    pub fn read_refresh(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Remove both tokens. Safe to call when nothing is stored.
    pub fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove credential");
            }
        }
        debug!("Credentials cleared");
    }

    /// A session exists iff an access token is stored
    pub fn has_session(&self) -> bool {
        self.read_access().is_some()
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read credential");
                None
            }
        }
    }
}
