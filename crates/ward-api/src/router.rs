//! Router configuration.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use ward_governance::LifecycleEngine;

use crate::handlers::{arms, requests, reviews, users};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct ApiState {
    /// The lifecycle engine behind every endpoint.
    pub engine: Arc<LifecycleEngine>,
}

/// Build the API router.
pub fn api_router(engine: Arc<LifecycleEngine>) -> Router {
    let state = ApiState { engine };
    Router::new()
        .route("/users", post(users::register).patch(users::edit_user))
        .route("/users/login", post(users::record_login))
        .route("/users/me/access", get(users::my_access))
        .route("/arms", get(arms::list))
        .route("/access-requests", post(requests::create))
        .route("/access-requests/approve", post(reviews::approve))
        .route("/access-requests/reject", post(reviews::reject))
        .route("/access-requests/revoke", post(reviews::revoke))
        .route("/admin/sweep", post(reviews::run_sweep))
        .with_state(state)
}
