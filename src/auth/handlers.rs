use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, LogoutRequest, MessageResponse, PublicUser,
            RefreshRequest, RegisterRequest,
        },
        jwt::{AuthUser, JwtKeys},
        password::verify_password,
        repo::{RevokedToken, User},
        services::register_user,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_string();

    // Same message for unknown email and bad password; no account
    // enumeration through the login endpoint.
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(AppError::auth("invalid email or password"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::auth("invalid email or password"));
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login on disabled account");
        return Err(AppError::auth("account disabled"));
    }

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = keys.sign_pair(user.id, user.role)?;

    info!(user_id = %user.id, role = %user.role, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| AppError::auth("invalid or expired refresh token"))?;

    if RevokedToken::is_revoked(&state.db, claims.jti).await? {
        warn!(user_id = %claims.sub, jti = %claims.jti, "refresh with revoked token");
        return Err(AppError::auth("refresh token revoked"));
    }

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::auth("invalid or expired refresh token"))?;
    if !user.is_active {
        return Err(AppError::auth("account disabled"));
    }

    let (access_token, refresh_token) = keys.sign_pair(user.id, user.role)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(user),
    }))
}

/// Revokes the posted refresh token. Requires a valid access token; a
/// malformed or expired refresh token is a validation failure, and revoking
/// twice is fine.
#[instrument(skip(state, payload))]
pub async fn logout(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<LogoutRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| AppError::validation("invalid refresh token"))?;

    RevokedToken::revoke(&state.db, claims.jti, claims.sub, claims.expires_at()?).await?;

    info!(user_id = %caller.id, jti = %claims.jti, "refresh token revoked");
    Ok(Json(MessageResponse {
        message: "logout successful".into(),
    }))
}
