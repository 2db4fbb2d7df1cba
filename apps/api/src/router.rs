use std::sync::Arc;

use axum::{routing::get, Router};

use auth_cell::{create_auth_router, SessionService};
use event_cell::{create_event_router, EventSchedulingService};
use patient_cell::{
    create_directory_router, create_patient_events_router, PatientDirectoryService,
    PatientEventsService,
};
use realtime_cell::{create_socket_token_router, create_ws_router, RealtimeState};
use shared_config::AppConfig;

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: Arc<SessionService>,
    pub scheduling: Arc<EventSchedulingService>,
    pub directory: Arc<PatientDirectoryService>,
    pub patient_events: Arc<PatientEventsService>,
    pub realtime: Arc<RealtimeState>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Scheduling API is running!" }))
        .nest("/auth", create_auth_router(state.session))
        .nest(
            "/doctors/events",
            create_event_router(state.config.clone(), state.scheduling),
        )
        .nest(
            "/doctors/patients",
            create_directory_router(state.config.clone(), state.directory),
        )
        .nest(
            "/patients/events",
            create_patient_events_router(state.config.clone(), state.patient_events),
        )
        .nest(
            "/patients/socket-token",
            create_socket_token_router(state.config, state.realtime.clone()),
        )
        .nest("/ws", create_ws_router(state.realtime))
}
