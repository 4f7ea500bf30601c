//! HTTP client module for the auth API.
//!
//! This module provides the `Executor` for single authenticated requests
//! and the `AuthClient` for the register, login and profile flows.
//!
//! Authenticated requests carry `Authorization: Bearer <access token>`
//! taken from the `CredentialStore`.

pub mod client;
pub mod error;
pub mod executor;

pub use client::AuthClient;
pub use error::{ApiError, ErrorBody};
pub use executor::{compose_headers, Executor, RequestDescriptor};
