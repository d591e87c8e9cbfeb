use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::roles;
use crate::server::AppState;
use crate::server::dto::{LoginRequest, LoginResponse};
use crate::server::response::{ApiError, FlatResponse};
use crate::server::validation::JsonBody;

/// Exchanges a GitHub OAuth token for a session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> impl IntoResponse {
    if req.token.trim().is_empty() {
        return Err(ApiError::key_error(
            Some("token".to_string()),
            "token cannot be empty",
        ));
    }

    let user = roles::login(state.store.as_ref(), state.remote.as_ref(), &req.token).await?;
    let access_token = state.sessions.issue(&user.id, user.role)?;

    Ok::<_, ApiError>(Json(
        FlatResponse::new(LoginResponse {
            access_token,
            usertype: user.role,
        })
        .with_message("SUCCESS"),
    ))
}
