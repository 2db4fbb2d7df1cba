use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::require_doctor;

use crate::handlers;
use crate::services::scheduling::EventSchedulingService;

/// Routes for /doctors/events. Every route requires a doctor session.
pub fn create_event_router(
    config: Arc<AppConfig>,
    service: Arc<EventSchedulingService>,
) -> Router {
    Router::new()
        .route("/", get(handlers::list_events).post(handlers::create_event))
        .route("/overlap-check", post(handlers::overlap_check))
        .route(
            "/{event_id}",
            get(handlers::get_event)
                .put(handlers::update_event)
                .delete(handlers::delete_event),
        )
        .layer(middleware::from_fn_with_state(config, require_doctor))
        .with_state(service)
}
