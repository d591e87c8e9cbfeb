use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{SearchParams, UserSummary};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::QueryParams;

pub async fn search_users(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<SearchParams>,
) -> impl IntoResponse {
    let keyword = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("NEED_KEYWORD", "Query parameter 'q' is required"))?;

    let users: Vec<UserSummary> = state
        .store
        .search_users(keyword)?
        .into_iter()
        .map(UserSummary::from)
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(users).with_message("SUCCESS")))
}
