use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::{require_doctor, require_patient};

use crate::handlers;
use crate::services::directory::PatientDirectoryService;
use crate::services::events::PatientEventsService;

/// Routes for /doctors/patients.
pub fn create_directory_router(
    config: Arc<AppConfig>,
    service: Arc<PatientDirectoryService>,
) -> Router {
    Router::new()
        .route("/", get(handlers::list_patients))
        .layer(middleware::from_fn_with_state(config, require_doctor))
        .with_state(service)
}

/// Routes for /patients/events.
pub fn create_patient_events_router(
    config: Arc<AppConfig>,
    service: Arc<PatientEventsService>,
) -> Router {
    Router::new()
        .route("/", get(handlers::list_patient_events))
        .layer(middleware::from_fn_with_state(config, require_patient))
        .with_state(service)
}
