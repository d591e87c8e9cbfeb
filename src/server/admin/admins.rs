use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::error::Error;
use crate::roles;
use crate::server::AppState;
use crate::server::dto::{InviteRequest, UserSummary};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::JsonBody;

/// Lists admins after promoting any pending admin the organization now confirms.
pub async fn list_admins(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let admins = roles::list_admins(
        state.store.as_ref(),
        state.remote.as_ref(),
        &auth.user.github_token,
    )
    .await?;

    let admins: Vec<UserSummary> = admins.into_iter().map(UserSummary::admin).collect();
    Ok::<_, ApiError>(Json(ApiResponse::success(admins).with_message("SUCCESS")))
}

pub async fn invite_admin(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<InviteRequest>,
) -> impl IntoResponse {
    let invitee = roles::request_elevation(
        state.store.as_ref(),
        state.remote.as_ref(),
        &auth.user,
        &req.username,
    )
    .await
    .map_err(|e| match e {
        // A rejected invitation is reported as 404.
        Error::Remote { op, source } => ApiError::new(
            StatusCode::NOT_FOUND,
            op.code(),
            format!("{op} failed: {source}"),
        ),
        e => e.into(),
    })?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserSummary::from(invitee)).with_message("CREATED")),
    ))
}

pub async fn revoke_admin(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    roles::revoke_admin(
        state.store.as_ref(),
        state.remote.as_ref(),
        &auth.user,
        &username,
    )
    .await?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
