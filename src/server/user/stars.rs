use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireUser;
use crate::collections;
use crate::server::AppState;
use crate::server::dto::{ExporterRequest, StarResponse};
use crate::server::response::{ApiError, FlatResponse};
use crate::server::validation::JsonBody;

pub async fn toggle_star(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<ExporterRequest>,
) -> impl IntoResponse {
    let is_star = collections::toggle_star(
        state.store.as_ref(),
        state.remote.as_ref(),
        &auth.user,
        req.exporter_id,
    )
    .await?;

    Ok::<_, ApiError>(Json(
        FlatResponse::new(StarResponse { is_star }).with_message("SUCCESS"),
    ))
}
