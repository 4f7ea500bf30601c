//! Auth operations against the API.
//!
//! Register and login are unauthenticated and send their requests
//! directly; profile and search requests go through the `Executor` so the
//! stored access token is attached.

use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::auth::CredentialStore;
use crate::models::{CredentialPair, LoginRequest, RegisterRequest, User};

use super::{ApiError, ErrorBody, Executor, RequestDescriptor};

// ============================================================================
// Endpoints
// ============================================================================

pub const REGISTER_PATH: &str = "/auth/register/";
pub const LOGIN_PATH: &str = "/auth/login/";
pub const PROFILE_PATH: &str = "/auth/profile/";
pub const SEARCH_USERS_PATH: &str = "/auth/search-users/";

#[derive(Clone)]
pub struct AuthClient {
    executor: Executor,
}

impl AuthClient {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn credentials(&self) -> &CredentialStore {
        self.executor.credentials()
    }

    /// Create an account. Does not sign in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, ApiError> {
        let body = RegisterRequest {
            email,
            password,
            password_confirm,
        };
        let user: User = self.post_unauthenticated(REGISTER_PATH, &body).await?;
        info!(user_id = user.id, "Registered new account");
        Ok(user)
    }

    /// Exchange email and password for a credential pair.
    ///
    /// The pair is returned, not stored; call `commit_session` to start
    /// the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<CredentialPair, ApiError> {
        let body = LoginRequest { email, password };
        self.post_unauthenticated(LOGIN_PATH, &body).await
    }

    /// Persist a credential pair obtained from `login`
    pub fn commit_session(&self, pair: &CredentialPair) {
        self.credentials().save(pair);
    }

    /// Forget the stored credentials
    pub fn logout(&self) {
        self.credentials().clear();
    }

    pub async fn get_profile(&self) -> Result<User, ApiError> {
        self.executor
            .execute(&RequestDescriptor::get(PROFILE_PATH))
            .await
    }

    pub async fn update_profile(&self, email: &str) -> Result<User, ApiError> {
        let request = RequestDescriptor::put(PROFILE_PATH).json(json!({ "email": email }));
        self.executor.execute(&request).await
    }

    /// Users whose email contains `query`
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, ApiError> {
        let request = RequestDescriptor::get(SEARCH_USERS_PATH).query("q", query);
        self.executor.execute(&request).await
    }

    async fn post_unauthenticated<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.executor.url(path);
        debug!(path, "Sending unauthenticated request");

        let response = self
            .executor
            .http()
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    /// Map a non-2xx response to `ApiError::Rejected` using its body
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = match response.text().await {
                Ok(body) => Some(body),
                Err(e) => {
                    warn!(error = %e, status = status.as_u16(), "Failed to read error body");
                    None
                }
            };
            Err(ApiError::Rejected {
                status,
                error: ErrorBody::for_response(status, body.as_deref()),
            })
        }
    }
}
