use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::require_patient;

use crate::handlers::{issue_socket_token, ws_handler, RealtimeState};

/// Routes for /patients/socket-token. Patient session required.
pub fn create_socket_token_router(config: Arc<AppConfig>, state: Arc<RealtimeState>) -> Router {
    Router::new()
        .route("/", get(issue_socket_token))
        .layer(middleware::from_fn_with_state(config, require_patient))
        .with_state(state)
}

/// Routes for /ws. The socket token in the query string is the credential, so
/// no session middleware is layered here.
pub fn create_ws_router(state: Arc<RealtimeState>) -> Router {
    Router::new().route("/", get(ws_handler)).with_state(state)
}
