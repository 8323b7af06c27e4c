//! Principal and account types.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use tiendita_core::{Email, Role, UserId};

use super::product::Product;

/// The authenticated principal as issued by the server.
///
/// `id` and `role` only ever come from a login or registration response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl User {
    /// "First Last", trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Partial profile update.
///
/// Deliberately has no `id` or `role` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UserPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }

    /// Shallow-merge into `user`.
    pub fn apply_to(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
    }
}

impl From<&User> for UserPatch {
    fn from(user: &User) -> Self {
        Self {
            email: Some(user.email.clone()),
            first_name: Some(user.first_name.clone()),
            last_name: Some(user.last_name.clone()),
        }
    }
}

/// Response of the login and register endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(alias = "access_token", alias = "token")]
    pub access_token: String,
    pub user: User,
}

/// Self-service account registration.
///
/// Only `buyer` and `seller` may self-register.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: Email,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// A seller's public page: profile plus catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default)]
    pub products: Vec<Product>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ana() -> User {
        User {
            id: UserId::new("u1"),
            email: Email::parse("a@b.edu").unwrap(),
            first_name: "Ana".to_string(),
            last_name: "Lopez".to_string(),
            role: Role::Seller,
        }
    }

    #[test]
    fn test_user_wire_format() {
        let json = r#"{"id":"u1","email":"a@b.edu","firstName":"Ana","lastName":"Lopez","role":"seller"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user, ana());
        assert_eq!(user.full_name(), "Ana Lopez");
    }

    #[test]
    fn test_patch_merges_only_given_fields() {
        let mut user = ana();
        UserPatch {
            first_name: Some("Nueva".to_string()),
            ..UserPatch::default()
        }
        .apply_to(&mut user);

        assert_eq!(user.first_name, "Nueva");
        assert_eq!(user.last_name, "Lopez");
        assert_eq!(user.id, UserId::new("u1"));
        assert_eq!(user.role, Role::Seller);
    }

    #[test]
    fn test_patch_ignores_id_and_role_on_the_wire() {
        let patch: UserPatch =
            serde_json::from_str(r#"{"firstName":"Eve","role":"admin","id":"u9"}"#).unwrap();
        let mut user = ana();
        patch.apply_to(&mut user);
        assert_eq!(user.role, Role::Seller);
        assert_eq!(user.id, UserId::new("u1"));
    }

    #[test]
    fn test_auth_response_accepts_token_aliases() {
        let json = r#"{"token":"tok123","user":{"id":"u1","email":"a@b.edu","firstName":"Ana","lastName":"Lopez","role":"seller"}}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token, "tok123");
    }
}
