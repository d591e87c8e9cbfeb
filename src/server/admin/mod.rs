mod admins;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admins", get(admins::list_admins).post(admins::invite_admin))
        .route("/admins/{username}", delete(admins::revoke_admin))
        .route("/users", get(users::search_users))
}
