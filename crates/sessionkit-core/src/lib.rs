//! Core library for sessionkit.
//!
//! This crate contains the authenticated request pipeline for a
//! token-authenticated HTTP API:
//!
//! - `storage`: Key-value persistence backends (memory, file, OS keyring)
//! - `auth`: Credential store and session guard
//! - `api`: Request executor and auth operations (register, login, profile)
//! - `models`: Wire types shared by the API and presentation layers
//! - `config`: Base URL, timeout and storage backend selection

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{ApiError, AuthClient, ErrorBody, Executor, RequestDescriptor};
pub use auth::{CredentialStore, Navigator, Route, SessionGuard, SessionState, ViewState};
pub use config::{Config, ConfigError, StorageKind};
pub use models::{CredentialPair, User};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, Storage, StorageError};
