//! Session and credential management.
//!
//! This module provides:
//! - `CredentialStore`: the access/refresh token pair on top of a `Storage`
//! - `SessionGuard`: session state machine and the clear-and-redirect path
//!
//! A session exists exactly when an access token is stored.

pub mod credentials;
pub mod guard;

pub use credentials::{CredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
pub use guard::{Navigator, Route, SessionGuard, SessionState, ViewState};
