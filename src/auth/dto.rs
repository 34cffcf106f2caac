use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::{Role, User};

/// Request body for user registration. `role` arrives as a plain string so
/// an unrecognized value gets a validation error, not a body-parse failure.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: String,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for logout (refresh-token revocation).
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Partial update of the caller's own identity fields.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public projection of an identity; the password hash never leaves the
/// repo layer.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub is_verified: bool,
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            phone_number: u.phone_number,
            role: u.role,
            address: u.address,
            profile_image: u.profile_image,
            is_verified: u.is_verified,
            created_at: u.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            username: "a1".into(),
            first_name: "Ada".into(),
            last_name: "L".into(),
            phone_number: None,
            address: None,
            profile_image: None,
            role: Role::Employer,
            password_hash: "$argon2id$secret".into(),
            is_verified: false,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("a@x.com"));
        assert!(json.contains("\"role\":\"employer\""));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }
}
