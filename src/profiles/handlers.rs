use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{PublicUser, UpdateUserRequest},
        jwt::AuthUser,
        repo::User,
        services::is_allowed_image,
    },
    error::{unique_violation, AppError},
    profiles::{
        dto::{UpdateAdminProfile, UpdateApplicantProfile, UpdateEmployerProfile},
        repo::{AdminProfile, ApplicantProfile, EmployerProfile, Profile},
    },
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_own_user).put(update_own_user))
        .route(
            "/admin-profile",
            get(get_admin_profile).put(update_admin_profile),
        )
        .route(
            "/employer-profile",
            get(get_employer_profile).put(update_employer_profile),
        )
        .route(
            "/applicant-profile",
            get(get_applicant_profile).put(update_applicant_profile),
        )
}

#[instrument(skip(state))]
pub async fn get_own_user(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = User::find_by_id(&state.db, caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_own_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, AppError> {
    if let Some(image) = &payload.profile_image {
        if !is_allowed_image(image) {
            return Err(AppError::validation(
                "profile image must be a jpg, jpeg, png or gif file",
            ));
        }
    }

    let user = User::update_own_fields(
        &state.db,
        caller.id,
        payload.first_name.as_deref(),
        payload.last_name.as_deref(),
        payload.phone_number.as_deref(),
        payload.address.as_deref(),
        payload.profile_image.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::not_found("user not found"))?;

    info!(user_id = %caller.id, "user fields updated");
    Ok(Json(PublicUser::from(user)))
}

// Each role endpoint is keyed by the caller's own id against the table for
// that role. A caller of another role simply has no row there, which is the
// not-found case rather than a view of anyone else's data.

#[instrument(skip(state))]
pub async fn get_admin_profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Profile>, AppError> {
    let profile = AdminProfile::find_by_user(&state.db, caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("admin profile not found"))?;
    Ok(Json(Profile::Admin(profile)))
}

#[instrument(skip(state, payload))]
pub async fn update_admin_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<UpdateAdminProfile>,
) -> Result<Json<Profile>, AppError> {
    let profile = AdminProfile::update(&state.db, caller.id, &payload)
        .await
        .map_err(|e| {
            if unique_violation(&e).is_some() {
                warn!(user_id = %caller.id, "employee id already in use");
                AppError::validation("employee id already in use")
            } else {
                e.into()
            }
        })?
        .ok_or_else(|| AppError::not_found("admin profile not found"))?;

    info!(user_id = %caller.id, "admin profile updated");
    Ok(Json(Profile::Admin(profile)))
}

#[instrument(skip(state))]
pub async fn get_employer_profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Profile>, AppError> {
    let profile = EmployerProfile::find_by_user(&state.db, caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("employer profile not found"))?;
    Ok(Json(Profile::Employer(profile)))
}

#[instrument(skip(state, payload))]
pub async fn update_employer_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<UpdateEmployerProfile>,
) -> Result<Json<Profile>, AppError> {
    if let Some(logo) = &payload.company_logo {
        if !is_allowed_image(logo) {
            return Err(AppError::validation(
                "company logo must be a jpg, jpeg, png or gif file",
            ));
        }
    }

    let profile = EmployerProfile::update(&state.db, caller.id, &payload)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("employer profile not found"))?;

    info!(user_id = %caller.id, "employer profile updated");
    Ok(Json(Profile::Employer(profile)))
}

#[instrument(skip(state))]
pub async fn get_applicant_profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Profile>, AppError> {
    let profile = ApplicantProfile::find_by_user(&state.db, caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("applicant profile not found"))?;
    Ok(Json(Profile::Applicant(profile)))
}

#[instrument(skip(state, payload))]
pub async fn update_applicant_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<UpdateApplicantProfile>,
) -> Result<Json<Profile>, AppError> {
    let profile = ApplicantProfile::update(&state.db, caller.id, &payload)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("applicant profile not found"))?;

    info!(user_id = %caller.id, "applicant profile updated");
    Ok(Json(Profile::Applicant(profile)))
}
