mod buckets;
mod profile;
mod session;
mod stars;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(session::login))
        .route("/stars", post(stars::toggle_star))
        // Profile
        .route(
            "/profile",
            get(profile::get_profile)
                .patch(profile::update_profile)
                .delete(profile::delete_profile),
        )
        .route("/profile/admin-status", get(profile::admin_status))
        // Buckets
        .route(
            "/buckets",
            get(buckets::list_buckets)
                .post(buckets::create_bucket)
                .delete(buckets::delete_bucket),
        )
}
