//! Session gate for views that need a signed-in user.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::api::AuthClient;
use crate::models::{CredentialPair, User};

/// Message shown when the profile cannot be loaded with the stored token
pub const PROFILE_LOAD_FAILED: &str = "Failed to load profile. Please log in again.";

/// Message shown when a guarded view is opened without a session
pub const NOT_SIGNED_IN: &str = "Not signed in.";

/// Client-side session state, derived from the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No access token stored
    Anonymous,
    /// Access token stored and not known to be rejected
    Authenticated,
    /// The stored access token was rejected by a profile fetch; awaiting clear
    Invalid,
}

/// Views the guard can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
        }
    }
}

/// Navigation primitive provided by the presentation layer.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: Route);
}

/// Render model for a view backed by one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> ViewState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Decides whether a guarded view may render, and resets the session
/// when the server rejects it.
pub struct SessionGuard {
    client: AuthClient,
    navigator: Arc<dyn Navigator>,
    // Access token a failed profile fetch was sent with
    rejected: Mutex<Option<String>>,
}

impl SessionGuard {
    pub fn new(client: AuthClient, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            client,
            navigator,
            rejected: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    /// Current session state, read from the store on every call.
    ///
    /// Invalid only while the rejected token is still the stored one, so
    /// clearing or replacing credentials through any path leaves it.
    pub fn state(&self) -> SessionState {
        let Some(token) = self.client.credentials().read_access() else {
            return SessionState::Anonymous;
        };
        let rejected = self.rejected.lock().ok().and_then(|r| r.clone());
        if rejected.as_deref() == Some(token.as_str()) {
            SessionState::Invalid
        } else {
            SessionState::Authenticated
        }
    }

    /// Redirect to the login view unless a token is stored
    pub fn require_session(&self) -> bool {
        if self.client.credentials().has_session() {
            true
        } else {
            self.navigator.redirect(Route::Login);
            false
        }
    }

    /// Commit a freshly issued credential pair (Anonymous -> Authenticated)
    pub fn sign_in(&self, pair: &CredentialPair) {
        self.client.credentials().save(pair);
        self.reset_rejected();
        info!("Session started");
    }

    /// Load the current user for a guarded view.
    ///
    /// Any failure clears the stored credentials and redirects to login;
    /// the error itself is not returned.
    pub async fn load_profile(&self) -> ViewState<User> {
        if !self.require_session() {
            return ViewState::Failed(NOT_SIGNED_IN.to_string());
        }

        match self.client.get_profile().await {
            Ok(user) => ViewState::Ready(user),
            Err(e) => {
                warn!(error = %e, "Profile fetch failed, invalidating session");
                self.invalidate();
                self.clear();
                self.navigator.redirect(Route::Login);
                ViewState::Failed(PROFILE_LOAD_FAILED.to_string())
            }
        }
    }

    /// Explicit logout (Authenticated -> Anonymous)
    pub fn logout(&self) {
        self.clear();
        info!("Logged out");
        self.navigator.redirect(Route::Home);
    }

    /// Remove stored credentials (Invalid/Authenticated -> Anonymous)
    pub fn clear(&self) {
        self.client.credentials().clear();
        self.reset_rejected();
    }

    /// Mark the currently stored access token as rejected
    fn invalidate(&self) {
        let token = self.client.credentials().read_access();
        if let Ok(mut rejected) = self.rejected.lock() {
            *rejected = token;
        }
    }

    fn reset_rejected(&self) {
        if let Ok(mut rejected) = self.rejected.lock() {
            *rejected = None;
        }
    }
}
