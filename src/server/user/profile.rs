use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use tracing::info;

use crate::auth::RequireUser;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{AdminStatusResponse, ProfileResponse, UpdateProfileRequest};
use crate::server::response::{ApiError, ApiResponse, FlatResponse};
use crate::server::validation::{JsonBody, validate_email};

fn no_user() -> ApiError {
    ApiError::bad_request("NO_USER", "User no longer exists")
}

/// `Some("")` clears a field, `None` keeps it.
fn apply(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *target = (!value.is_empty()).then_some(value);
    }
}

pub async fn get_profile(auth: RequireUser) -> impl IntoResponse {
    Json(ApiResponse::success(ProfileResponse::from(auth.user)).with_message("SUCCESS"))
}

pub async fn update_profile(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> impl IntoResponse {
    if let Some(email) = req.email.as_deref().filter(|e| !e.is_empty()) {
        validate_email(email)?;
    }

    let mut user = state.store.get_user(&auth.user.id)?.ok_or_else(no_user)?;
    apply(&mut user.email, req.email);
    apply(&mut user.fullname, req.name);
    apply(&mut user.organization, req.organization);
    user.updated_at = Utc::now();

    state.store.update_user(&user).map_err(|e| match e {
        Error::AlreadyExists => ApiError {
            field: Some("email".to_string()),
            ..ApiError::conflict("EMAIL_ALREADY_EXISTS", "Email is already in use")
        },
        Error::NotFound => no_user(),
        e => e.into(),
    })?;

    Ok::<_, ApiError>(Json(
        ApiResponse::success(ProfileResponse::from(user)).with_message("SUCCESS"),
    ))
}

pub async fn delete_profile(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    state.store.delete_user(&auth.user.id)?;
    info!("Deleted user '{}'", auth.user.username);

    Ok::<_, ApiError>(Json(ApiResponse::message("SUCCESS")))
}

pub async fn admin_status(auth: RequireUser) -> impl IntoResponse {
    Json(FlatResponse::new(AdminStatusResponse {
        is_admin: auth.user.role.is_admin(),
    }))
}
