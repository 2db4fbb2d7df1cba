use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::session::SessionService;

/// Routes for /auth. Login and logout are open; /me validates its own
/// bearer token since either user type may call it.
pub fn create_auth_router(service: Arc<SessionService>) -> Router {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .with_state(service)
}
