//! Login, registration and logout.
//!
//! These are the only operations that write a token into the session.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;

use tiendita_core::{Email, Role};

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::models::{AuthResponse, RegisterRequest, User};

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    email: &'a str,
    password: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    role: Role,
}

/// Authentication operations.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `POST /auth/login`, then start the session.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`]; the session is untouched on failure.
    #[instrument(skip(self, email, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<User, ApiError> {
        let body = LoginBody {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let response: AuthResponse = self
            .api
            .post(&["auth", "login"], &body, RequestOptions::public())
            .await?;
        Ok(self.start_session(response))
    }

    /// `POST /auth/register`, then start the session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an `admin` role or blank names
    /// without calling the server; otherwise propagates any [`ApiError`].
    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        if request.role == Role::Admin {
            return Err(ApiError::Validation(
                "admin accounts cannot self-register".to_string(),
            ));
        }
        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(ApiError::Validation("first and last name are required".to_string()));
        }

        let body = RegisterBody {
            email: request.email.as_str(),
            password: request.password.expose_secret(),
            first_name: request.first_name.trim(),
            last_name: request.last_name.trim(),
            role: request.role,
        };
        let response: AuthResponse = self
            .api
            .post(&["auth", "register"], &body, RequestOptions::public())
            .await?;
        Ok(self.start_session(response))
    }

    /// `GET /auth/profile`: the principal the server associates with the token.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn profile(&self) -> Result<User, ApiError> {
        self.api.get(&["auth", "profile"], RequestOptions::default()).await
    }

    /// End the session locally. No network call.
    pub fn logout(&self) {
        self.api.session().logout();
    }

    fn start_session(&self, response: AuthResponse) -> User {
        let user = response.user;
        self.api.session().login(response.access_token, user.clone());
        user
    }
}
