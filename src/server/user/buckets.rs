use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireUser;
use crate::collections::{self, BucketOutcome};
use crate::server::AppState;
use crate::server::dto::{BucketItem, BucketResponse, DeleteBucketParams, ExporterRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::{JsonBody, QueryParams};

pub async fn create_bucket(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<ExporterRequest>,
) -> impl IntoResponse {
    let outcome = collections::create_bucket(
        state.store.as_ref(),
        state.remote.as_ref(),
        &auth.user,
        req.exporter_id,
    )
    .await?;

    let bucket = outcome.bucket();
    let body = ApiResponse::success(BucketResponse {
        exporter_id: bucket.exporter_id,
        forked_repository_url: bucket.forked_repository_url.clone(),
    });

    let body = match outcome {
        BucketOutcome::Created(_) => body,
        BucketOutcome::AlreadyForked(_) => body.with_message("ALREADY_FORKED"),
    };

    Ok::<_, ApiError>(Json(body))
}

pub async fn delete_bucket(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<DeleteBucketParams>,
) -> impl IntoResponse {
    collections::delete_bucket(
        state.store.as_ref(),
        state.remote.as_ref(),
        &auth.user,
        params.exporter_id,
        params.delete_remote(),
    )
    .await?;

    Ok::<_, ApiError>(Json(ApiResponse::message("SUCCESS")))
}

pub async fn list_buckets(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let items: Vec<BucketItem> = state
        .store
        .list_user_buckets(&auth.user.id)?
        .into_iter()
        .map(BucketItem::from)
        .collect();

    let body = if items.is_empty() {
        ApiResponse::success(items).with_message("EMPTY")
    } else {
        ApiResponse::success(items)
    };

    Ok::<_, ApiError>(Json(body))
}
