use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;
use tracing::{info, warn};

use crate::auth::dto::RegisterRequest;
use crate::auth::password::hash_password;
use crate::auth::repo::{NewUser, Role, User};
use crate::error::{unique_violation, AppError};
use crate::profiles::repo::Profile;
use crate::state::AppState;

const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_allowed_image(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Pure input validation for registration; returns the parsed role.
/// Uniqueness is not checked here, the store's unique indexes own that.
pub fn validate_register(req: &RegisterRequest) -> Result<Role, AppError> {
    if req.password != req.confirm_password {
        return Err(AppError::validation("passwords do not match"));
    }
    if !is_valid_email(req.email.trim()) {
        return Err(AppError::validation("invalid email address"));
    }
    if req.username.trim().is_empty() {
        return Err(AppError::validation("username must not be empty"));
    }
    let role = Role::from_str(&req.role)
        .map_err(|_| AppError::validation("role must be one of admin, employer, applicant"))?;
    if let Some(image) = &req.profile_image {
        if !is_allowed_image(image) {
            return Err(AppError::validation(
                "profile image must be a jpg, jpeg, png or gif file",
            ));
        }
    }
    Ok(role)
}

/// A raced unique-index violation gets the same message the advisory
/// pre-check would have produced.
fn map_insert_error(e: sqlx::Error) -> AppError {
    match unique_violation(&e) {
        Some(c) if c.contains("email") => AppError::validation("email already registered"),
        Some(c) if c.contains("username") => AppError::validation("username already taken"),
        Some(c) => AppError::Conflict(format!("duplicate value for {c}")),
        None => e.into(),
    }
}

/// Create an identity and its role-specific profile as one transaction,
/// then fire the welcome notification after commit.
pub async fn register_user(state: &AppState, req: RegisterRequest) -> Result<User, AppError> {
    let role = validate_register(&req)?;
    let email = req.email.trim();
    let username = req.username.trim();

    // Advisory fast-path checks; the insert below is the real guard.
    if User::find_by_email(&state.db, email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::validation("email already registered"));
    }
    if User::find_by_username(&state.db, username).await?.is_some() {
        warn!(username = %username, "username already taken");
        return Err(AppError::validation("username already taken"));
    }

    let password_hash = hash_password(&req.password)?;

    let mut tx = state.db.begin().await.map_err(AppError::from)?;

    let user = User::create(
        &mut tx,
        NewUser {
            email,
            username,
            first_name: req.first_name.trim(),
            last_name: req.last_name.trim(),
            phone_number: req.phone_number.as_deref(),
            address: req.address.as_deref(),
            profile_image: req.profile_image.as_deref(),
            role,
            password_hash: &password_hash,
        },
    )
    .await
    .map_err(map_insert_error)?;

    Profile::create_for(&mut tx, &user)
        .await
        .map_err(map_insert_error)?;

    tx.commit().await.map_err(AppError::from)?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");

    // Post-commit, fire-and-forget: a failed mail never fails registration.
    let notifier = state.notifier.clone();
    let (to, name, user_role) = (user.email.clone(), user.username.clone(), user.role);
    tokio::spawn(async move {
        if let Err(e) = notifier.welcome(&to, &name, user_role).await {
            warn!(error = %e, to = %to, "welcome notification failed");
        }
    });

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> RegisterRequest {
        RegisterRequest {
            email: "a@x.com".into(),
            username: "a1".into(),
            first_name: "Ada".into(),
            last_name: "L".into(),
            phone_number: None,
            role: "employer".into(),
            address: None,
            profile_image: None,
            password: "p".into(),
            confirm_password: "p".into(),
        }
    }

    #[test]
    fn accepts_valid_request() {
        assert_eq!(validate_register(&base_request()).unwrap(), Role::Employer);
    }

    #[test]
    fn rejects_password_mismatch() {
        let mut req = base_request();
        req.confirm_password = "other".into();
        let err = validate_register(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_invalid_email() {
        let mut req = base_request();
        req.email = "not-an-email".into();
        assert!(matches!(
            validate_register(&req),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_unknown_role() {
        let mut req = base_request();
        req.role = "superuser".into();
        let err = validate_register(&req).unwrap_err();
        assert!(err.to_string().contains("role"));
    }

    #[test]
    fn rejects_disallowed_image_extension() {
        let mut req = base_request();
        req.profile_image = Some("avatar.bmp".into());
        assert!(matches!(
            validate_register(&req),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn accepts_allowed_image_extensions() {
        for name in ["a.jpg", "b.jpeg", "c.png", "d.gif", "e.PNG"] {
            assert!(is_allowed_image(name), "{name} should be allowed");
        }
        for name in ["a.bmp", "b.svg", "noext", "tar.gz"] {
            assert!(!is_allowed_image(name), "{name} should be rejected");
        }
    }

    #[test]
    fn email_regex_behaves() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user example.com"));
        assert!(!is_valid_email("user@example"));
    }
}
