//! Profiles.

use tracing::{info, instrument};

use tiendita_core::UserId;

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::models::{PublicUser, User, UserPatch};

/// Public seller pages and self-service profile edits.
#[derive(Debug, Clone)]
pub struct UsersService {
    api: ApiClient,
}

impl UsersService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /users/public/:id`: a seller's profile and catalog.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn public_profile(&self, id: &UserId) -> Result<PublicUser, ApiError> {
        self.api
            .get(&["users", "public", id.as_str()], RequestOptions::public())
            .await
    }

    /// `PATCH /users/me`, then merge the server's answer into the session.
    ///
    /// Only the editable fields of the response are merged, so the session
    /// keeps its `id` and `role` whatever the server echoes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an empty patch without calling
    /// the server; otherwise propagates any [`ApiError`], leaving the session
    /// unchanged.
    #[instrument(skip(self, patch))]
    pub async fn update_me(&self, patch: &UserPatch) -> Result<User, ApiError> {
        if patch.is_empty() {
            return Err(ApiError::Validation("nothing to update".to_string()));
        }
        let updated: User = self
            .api
            .patch(&["users", "me"], patch, RequestOptions::default())
            .await?;

        self.api.session().update_user(UserPatch::from(&updated));
        info!("profile updated");
        Ok(self.api.session().user().unwrap_or(updated))
    }
}
