use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::services::directory::PatientDirectoryService;
use crate::services::events::PatientEventsService;

/// GET /doctors/patients.
pub async fn list_patients(
    State(service): State<Arc<PatientDirectoryService>>,
) -> Result<Json<Value>, AppError> {
    let patients = service.list().await?;
    Ok(Json(json!({ "patients": patients })))
}

/// GET /patients/events.
pub async fn list_patient_events(
    State(service): State<Arc<PatientEventsService>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let events = service.list(user.id).await?;
    Ok(Json(json!(events)))
}
